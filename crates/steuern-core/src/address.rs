//! Project id extraction from the panel's page address.
//!
//! The panel is opened for an address such as
//! `http://localhost:5000/projekt/7/steuern`. The project id is the path
//! segment following [`PROJECT_MARKER`]. When it cannot be resolved every
//! project-scoped action is disabled.

use url::Url;

use crate::types::ProjectId;

/// Path segment that precedes the project id.
pub const PROJECT_MARKER: &str = "projekt";

/// Extract the project id from a page address.
///
/// Accepts absolute URLs and bare paths. The segment after the first
/// `projekt` segment is read as a decimal number, ignoring any trailing
/// non-digit characters. Zero, a missing segment or a segment without a
/// leading digit all yield `None`.
pub fn project_id_from_address(address: &str) -> Option<ProjectId> {
    let path = match Url::parse(address) {
        Ok(url) => url.path().to_string(),
        Err(_) => address.split(['?', '#']).next().unwrap_or_default().to_string(),
    };

    let mut segments = path.split('/');
    segments.find(|segment| *segment == PROJECT_MARKER)?;
    let candidate = segments.next()?;

    let digits: String = candidate.chars().take_while(|c| c.is_ascii_digit()).collect();
    let value: u64 = digits.parse().ok()?;
    if value == 0 {
        return None;
    }
    Some(ProjectId(value))
}

/// Origin (`scheme://host[:port]`) of an absolute page address.
pub fn origin_of(address: &str) -> Option<String> {
    let url = Url::parse(address).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let origin = url.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url() {
        assert_eq!(
            project_id_from_address("http://localhost:5000/projekt/7/steuern"),
            Some(ProjectId(7))
        );
    }

    #[test]
    fn test_bare_path_with_query() {
        assert_eq!(
            project_id_from_address("/projekt/12/steuern?tab=chat"),
            Some(ProjectId(12))
        );
    }

    #[test]
    fn test_trailing_garbage_is_ignored() {
        assert_eq!(project_id_from_address("/projekt/3abc"), Some(ProjectId(3)));
    }

    #[test]
    fn test_missing_marker() {
        assert_eq!(project_id_from_address("http://localhost:5000/steuern"), None);
    }

    #[test]
    fn test_marker_without_id() {
        assert_eq!(project_id_from_address("/projekt/"), None);
        assert_eq!(project_id_from_address("/projekt"), None);
        assert_eq!(project_id_from_address("/projekt/liste"), None);
    }

    #[test]
    fn test_zero_is_not_a_project() {
        assert_eq!(project_id_from_address("/projekt/0/steuern"), None);
    }

    #[test]
    fn test_origin_of() {
        assert_eq!(
            origin_of("http://localhost:5000/projekt/7/steuern").as_deref(),
            Some("http://localhost:5000")
        );
        assert_eq!(origin_of("/projekt/7/steuern"), None);
    }
}
