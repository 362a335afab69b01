use serde::Serialize;

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequest<'a> {
    pub user_id: &'a str,
}

// The message payload is `OutboundMessage` itself, and the reset reply body
// is never inspected, only its status.

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_reset_request() {
        let req = ResetRequest { user_id: "web-user" };
        assert_eq!(
            serde_json::to_value(req).unwrap(),
            json!({ "userId": "web-user" })
        );
    }
}
