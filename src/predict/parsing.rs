use crate::error::{TransitError, TransitResult};

/// Split element-set text into an optional name line and the two element lines.
pub fn parse_tle_lines(tle: &str) -> TransitResult<(Option<String>, String, String)> {
    let lines: Vec<&str> = tle
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    match lines.as_slice() {
        [line1, line2] => Ok((None, line1.to_string(), line2.to_string())),
        [name, line1, line2] => Ok((
            Some(name.to_string()),
            line1.to_string(),
            line2.to_string(),
        )),
        _ => Err(TransitError::Propagation(format!(
            "expected 2 or 3 element lines, got {}",
            lines.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_line_form_keeps_name() {
        let (name, l1, l2) = parse_tle_lines("ISS (ZARYA)\n1 25544U\n2 25544").unwrap();
        assert_eq!(name.as_deref(), Some("ISS (ZARYA)"));
        assert_eq!(l1, "1 25544U");
        assert_eq!(l2, "2 25544");
    }

    #[test]
    fn two_line_form() {
        let (name, _, _) = parse_tle_lines("1 25544U\n\n2 25544\n").unwrap();
        assert!(name.is_none());
    }

    #[test]
    fn garbage_is_a_propagation_error() {
        let err = parse_tle_lines("fake_tle").unwrap_err();
        assert!(matches!(err, TransitError::Propagation(_)));
    }
}
