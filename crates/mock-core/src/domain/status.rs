//! Session status line formatting.
//!
//! Every report the console prints for a session has the same shape so that
//! a scrolling terminal stays scannable:
//!
//! ```text
//!  -Status-:               Alice:Last Event:10:00:00
//!   Created:                 Bob::42
//! Activated:                 Bob::            operator:42
//! ```
//!
//! The reason is right-justified to 9 columns, the session name to 20.  Status
//! reports end with the client's last contact in local wall-clock time; event
//! reports end with the identity (when the client has one) and the session id.

use std::fmt::{Display, Write as _};

use chrono::{DateTime, Local, TimeZone};

use super::session::{SessionDiagnostics, SessionId};

/// Reason label used for periodic heartbeat reports.
pub const STATUS_REASON: &str = "-Status-";

const REASON_WIDTH: usize = 9;
const NAME_WIDTH: usize = 20;
const IDENTITY_WIDTH: usize = 20;

/// Formats a status line, rendering the last-contact time in the local zone.
pub fn format_status_line(
    id: &SessionId,
    diagnostics: &SessionDiagnostics,
    reason: &str,
    show_last_contact: bool,
) -> String {
    format_status_line_in(id, diagnostics, reason, show_last_contact, &Local)
}

/// Formats a status line, rendering the last-contact time in `tz`.
pub fn format_status_line_in<Tz>(
    id: &SessionId,
    diagnostics: &SessionDiagnostics,
    reason: &str,
    show_last_contact: bool,
    tz: &Tz,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut line = format!(
        "{reason:>rw$}:{name:>nw$}:",
        reason = reason,
        name = diagnostics.session_name,
        rw = REASON_WIDTH,
        nw = NAME_WIDTH,
    );

    // Writing into a String cannot fail.
    if show_last_contact {
        let local: DateTime<Tz> = diagnostics.client_last_contact.with_timezone(tz);
        let _ = write!(line, "Last Event:{}", local.format("%H:%M:%S"));
    } else {
        if let Some(identity) = &diagnostics.identity {
            let _ = write!(
                line,
                ":{name:>iw$}",
                name = identity.display_name,
                iw = IDENTITY_WIDTH
            );
        }
        let _ = write!(line, ":{id}");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::UserIdentity;
    use chrono::{FixedOffset, Utc};

    fn diagnostics(name: &str, identity: Option<&str>) -> SessionDiagnostics {
        SessionDiagnostics {
            session_name: name.to_string(),
            client_last_contact: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            identity: identity.map(UserIdentity::new),
        }
    }

    #[test]
    fn test_status_line_with_last_contact_in_utc() {
        // Arrange
        let diag = diagnostics("Alice", None);

        // Act
        let line = format_status_line_in(&SessionId::new("42"), &diag, STATUS_REASON, true, &Utc);

        // Assert
        assert!(line.contains("Last Event:10:00:00"), "got {line:?}");
        assert!(line.starts_with(" -Status-:"), "reason must be right-justified: {line:?}");
        assert!(
            line.contains(&format!(":{:>20}:", "Alice")),
            "name must be right-justified to 20: {line:?}"
        );
        assert_eq!(line, format!(" -Status-:{:>20}:Last Event:10:00:00", "Alice"));
    }

    #[test]
    fn test_status_line_converts_last_contact_to_given_zone() {
        let diag = diagnostics("Alice", None);
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let line = format_status_line_in(&SessionId::new("42"), &diag, STATUS_REASON, true, &plus_two);
        assert!(line.ends_with("Last Event:12:00:00"), "got {line:?}");
    }

    #[test]
    fn test_event_line_without_identity_ends_in_session_id() {
        // Arrange
        let diag = diagnostics("Bob", None);

        // Act
        let line = format_status_line_in(&SessionId::new("99"), &diag, "SessionClosing", false, &Utc);

        // Assert
        assert!(line.ends_with("99"), "got {line:?}");
        assert_eq!(line, format!("SessionClosing:{:>20}::99", "Bob"));
        assert!(!line.contains("Last Event"));
    }

    #[test]
    fn test_event_line_with_identity_pads_identity_before_id() {
        let diag = diagnostics("Bob", Some("operator"));
        let line = format_status_line_in(&SessionId::new("99"), &diag, "Activated", false, &Utc);
        assert_eq!(
            line,
            format!("Activated:{:>20}::{:>20}:99", "Bob", "operator")
        );
    }

    #[test]
    fn test_short_reason_is_padded_to_nine_columns() {
        let diag = diagnostics("Bob", None);
        let line = format_status_line_in(&SessionId::new("1"), &diag, "Created", false, &Utc);
        assert!(line.starts_with("  Created:"), "got {line:?}");
    }

    #[test]
    fn test_long_names_are_not_truncated() {
        let diag = diagnostics("a-session-name-longer-than-twenty", None);
        let line = format_status_line_in(&SessionId::new("1"), &diag, "Created", false, &Utc);
        assert!(line.contains(":a-session-name-longer-than-twenty:"));
    }
}
