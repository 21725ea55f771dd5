//! SOAP 1.1 envelopes for zero-argument TR-064 actions

use crate::error::TransportError;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

/// Request body invoking `action` of `service_type` without arguments
pub fn build_envelope(service_type: &str, action: &str) -> String {
    let action = escape(action);
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<s:Envelope s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/" "#,
            r#"xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">"#,
            r#"<s:Body><u:{action} xmlns:u="{service}"></u:{action}></s:Body>"#,
            r#"</s:Envelope>"#
        ),
        action = action,
        service = escape(service_type),
    )
}

/// Output values of a SOAP response, keyed by element name
///
/// Namespace prefixes are ignored. A `Fault` body becomes
/// [`TransportError::Fault`], preferring the UPnP error code and description.
pub fn parse_response(xml: &str) -> Result<HashMap<String, String>, TransportError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    // Element names from the envelope down to the current element
    let mut path: Vec<String> = Vec::new();
    let mut values = HashMap::new();
    let mut fault: Option<HashMap<String, String>> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if path.len() == 2 && path[1] == "Body" && name == "Fault" {
                    fault = Some(HashMap::new());
                }
                path.push(name);
            }
            Event::Empty(e) => {
                if path.len() == 3 && path[1] == "Body" && fault.is_none() {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    values.insert(name, String::new());
                }
            }
            Event::Text(t) => {
                let text = t.unescape()?.into_owned();
                let Some(leaf) = path.last() else { continue };
                if let Some(fault) = fault.as_mut() {
                    fault.insert(leaf.clone(), text);
                } else if path.len() == 4 && path[1] == "Body" {
                    values.insert(leaf.clone(), text);
                }
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match fault {
        Some(details) => {
            let code = details
                .get("errorCode")
                .or_else(|| details.get("faultcode"))
                .cloned()
                .unwrap_or_default();
            let description = details
                .get("errorDescription")
                .or_else(|| details.get("faultstring"))
                .cloned()
                .unwrap_or_default();
            Err(TransportError::Fault { code, description })
        }
        None => Ok(values),
    }
}
