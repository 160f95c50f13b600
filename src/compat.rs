//! Choosing `PYTHON_COMPAT` for a generated ebuild.

const PYTHON_CLASSIFIER: &str = "Programming Language :: Python :: ";

/// Pick the Python implementations a package is declared for.
///
/// `supported` is the list of targets the repository can build for
/// (`python3_12`, ...), in the order they should be written. The result is
/// the subset named by `Programming Language :: Python :: 3.N` classifiers;
/// without such classifiers, the subset allowed by a `>=3.N` lower bound in
/// `requires_python`; failing that, every supported target.
///
/// # Examples
///
/// ```
/// use pypi_ebuild::compat::python_compat;
///
/// let supported = ["python3_11", "python3_12", "python3_13"].map(String::from);
/// let classifiers = ["Programming Language :: Python :: 3.12".to_string()];
/// assert_eq!(python_compat(&classifiers, None, &supported), vec!["python3_12"]);
/// assert_eq!(python_compat(&[], Some(">=3.12"), &supported), vec!["python3_12", "python3_13"]);
/// ```
pub fn python_compat(
    classifiers: &[String],
    requires_python: Option<&str>,
    supported: &[String],
) -> Vec<String> {
    let declared: Vec<String> = classifiers
        .iter()
        .filter_map(|c| c.strip_prefix(PYTHON_CLASSIFIER))
        .filter_map(target_for)
        .collect();

    let from_classifiers: Vec<String> = supported
        .iter()
        .filter(|t| declared.contains(t))
        .cloned()
        .collect();
    if !from_classifiers.is_empty() {
        return from_classifiers;
    }

    if let Some(minimum) = requires_python.and_then(lower_bound) {
        let allowed: Vec<String> = supported
            .iter()
            .filter(|t| minor_of(t).is_some_and(|minor| minor >= minimum))
            .cloned()
            .collect();
        if !allowed.is_empty() {
            return allowed;
        }
    }

    supported.to_vec()
}

/// `3.12` -> `python3_12`
fn target_for(version: &str) -> Option<String> {
    let (major, minor) = version.trim().split_once('.')?;
    if major != "3" || minor.is_empty() || !minor.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("python3_{minor}"))
}

/// `python3_12` -> 12
fn minor_of(target: &str) -> Option<u32> {
    target.strip_prefix("python3_")?.parse().ok()
}

/// Minor version from the first `>=3.N` clause of `requires_python`.
fn lower_bound(requires_python: &str) -> Option<u32> {
    requires_python
        .split(',')
        .filter_map(|clause| clause.trim().strip_prefix(">="))
        .find_map(|version| {
            let mut parts = version.trim().split('.');
            match (parts.next(), parts.next()) {
                (Some("3"), Some(minor)) => minor.parse().ok(),
                _ => None,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supported() -> Vec<String> {
        ["python3_11", "python3_12", "python3_13"]
            .map(String::from)
            .to_vec()
    }

    fn classifiers(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn classifiers_intersected_with_supported() {
        let cls = classifiers(&[
            "Programming Language :: Python :: 3",
            "Programming Language :: Python :: 3 :: Only",
            "Programming Language :: Python :: 3.8",
            "Programming Language :: Python :: 3.13",
            "Programming Language :: Python :: 3.11",
        ]);
        assert_eq!(
            python_compat(&cls, None, &supported()),
            vec!["python3_11", "python3_13"]
        );
    }

    #[test]
    fn requires_python_lower_bound() {
        assert_eq!(
            python_compat(&[], Some(">=3.12, <4"), &supported()),
            vec!["python3_12", "python3_13"]
        );
    }

    #[test]
    fn falls_back_to_all_supported() {
        let cls = classifiers(&["Programming Language :: Python :: 2.7"]);
        assert_eq!(python_compat(&cls, None, &supported()), supported());
        assert_eq!(python_compat(&[], Some(">=3.20"), &supported()), supported());
        assert_eq!(python_compat(&[], Some("~=3.8"), &supported()), supported());
    }
}
