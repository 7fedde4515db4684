use super::ScanError;

/// Marker preceding the ticket identifier in a decoded QR payload.
pub const TICKET_ID_MARKER: &str = "TicketID:";

/// Pulls the ticket identifier out of decoded QR text.
///
/// The identifier runs from the first `TicketID:` marker to the next line
/// break, the next marker, or the end of the text, taken verbatim apart from
/// a trailing `\r`. It may be empty; only a missing marker is unrecognized.
pub fn extract_ticket_id(payload: &str) -> Result<String, ScanError> {
    let (_, rest) = payload
        .split_once(TICKET_ID_MARKER)
        .ok_or(ScanError::UnrecognizedPayload)?;

    let rest = rest.split(TICKET_ID_MARKER).next().unwrap_or_default();
    let line = rest.split('\n').next().unwrap_or_default();

    Ok(line.strip_suffix('\r').unwrap_or(line).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_identifier_from_issued_payload() {
        let payload = "Gusau BRT\nTicketID:BRT-20241231-0007\nType:Single-Ride\nExpires:2025-01-01";
        assert_eq!(extract_ticket_id(payload).unwrap(), "BRT-20241231-0007");
    }

    #[test]
    fn test_identifier_at_end_of_text() {
        assert_eq!(extract_ticket_id("TicketID:T1").unwrap(), "T1");
    }

    #[test]
    fn test_crlf_is_stripped_but_padding_is_kept() {
        assert_eq!(extract_ticket_id("TicketID:T1\r\nType:x").unwrap(), "T1");
        assert_eq!(extract_ticket_id("TicketID: T1 \nType:x").unwrap(), " T1 ");
    }

    #[test]
    fn test_only_first_marker_counts() {
        assert_eq!(extract_ticket_id("TicketID:A TicketID:B").unwrap(), "A ");
    }

    #[test]
    fn test_missing_marker_is_unrecognized() {
        assert!(matches!(
            extract_ticket_id("https://example.com/ticket/T1"),
            Err(ScanError::UnrecognizedPayload)
        ));
        assert!(matches!(
            extract_ticket_id("ticketid:T1"),
            Err(ScanError::UnrecognizedPayload)
        ));
    }

    #[test]
    fn test_empty_identifier_is_extracted() {
        assert_eq!(extract_ticket_id("TicketID:\nType:Single-Ride").unwrap(), "");
        assert_eq!(extract_ticket_id("TicketID:").unwrap(), "");
        assert_eq!(extract_ticket_id("TicketID:   ").unwrap(), "   ");
    }
}
