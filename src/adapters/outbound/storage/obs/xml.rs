//! XML bodies of the OBS listing and error responses.

use chrono::{DateTime, Utc};
use http::StatusCode;
use quick_xml::de::from_str;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Deserialize;
use std::io::Cursor;

use super::api::{ListObjectsOutput, ObsContent};
use crate::adapters::outbound::storage::error::ObsError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListBucketResultXml {
    #[serde(default)]
    name: String,
    #[serde(default)]
    prefix: String,
    #[serde(default)]
    next_marker: Option<String>,
    #[serde(default)]
    is_truncated: bool,
    #[serde(default)]
    contents: Vec<ContentsXml>,
    #[serde(default)]
    common_prefixes: Vec<CommonPrefixesXml>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContentsXml {
    key: String,
    #[serde(default)]
    last_modified: Option<String>,
    #[serde(default, rename = "ETag")]
    etag: Option<String>,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CommonPrefixesXml {
    prefix: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorXml {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    request_id: Option<String>,
}

/// Parse a `ListBucketResult` body
pub fn parse_list_objects(body: &str) -> Result<ListObjectsOutput, ObsError> {
    let result: ListBucketResultXml =
        from_str(body).map_err(|e| ObsError::Xml(format!("Failed to parse listing: {}", e)))?;

    Ok(ListObjectsOutput {
        name: result.name,
        prefix: result.prefix,
        is_truncated: result.is_truncated,
        next_marker: result.next_marker.filter(|m| !m.is_empty()),
        contents: result
            .contents
            .into_iter()
            .map(|c| ObsContent {
                key: c.key,
                size: c.size,
                last_modified: c.last_modified.as_deref().and_then(parse_timestamp),
                etag: c.etag.map(|e| e.trim_matches('"').to_string()),
            })
            .collect(),
        common_prefixes: result
            .common_prefixes
            .into_iter()
            .map(|p| p.prefix)
            .collect(),
    })
}

/// Build a service error from a non-success response.
///
/// The body is parsed best-effort; an empty or unreadable body (HEAD, some
/// proxies) falls back to the status alone.
pub fn parse_error(status: StatusCode, body: &str) -> ObsError {
    if body.trim().is_empty() {
        return ObsError::from_status(status);
    }

    match from_str::<ErrorXml>(body) {
        Ok(err) if !err.code.is_empty() => ObsError::Service {
            status,
            code: err.code,
            message: err.message,
            request_id: err.request_id,
        },
        _ => ObsError::from_status(status),
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn format_timestamp(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn write_text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), ObsError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(|e| ObsError::Xml(format!("Failed to write {} start: {}", name, e)))?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(|e| ObsError::Xml(format!("Failed to write {} text: {}", name, e)))?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| ObsError::Xml(format!("Failed to write {} end: {}", name, e)))?;
    Ok(())
}

fn write_start<W: std::io::Write>(writer: &mut Writer<W>, name: &str) -> Result<(), ObsError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map(|_| ())
        .map_err(|e| ObsError::Xml(format!("Failed to write {} start: {}", name, e)))
}

fn write_end<W: std::io::Write>(writer: &mut Writer<W>, name: &str) -> Result<(), ObsError> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map(|_| ())
        .map_err(|e| ObsError::Xml(format!("Failed to write {} end: {}", name, e)))
}

/// Render a listing page as the store would send it
pub fn list_objects_to_xml(output: &ListObjectsOutput, delimiter: &str) -> Result<String, ObsError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| ObsError::Xml(format!("Failed to write XML declaration: {}", e)))?;

    write_start(&mut writer, "ListBucketResult")?;
    write_text_element(&mut writer, "Name", &output.name)?;
    write_text_element(&mut writer, "Prefix", &output.prefix)?;
    if let Some(ref marker) = output.next_marker {
        write_text_element(&mut writer, "NextMarker", marker)?;
    }
    if !delimiter.is_empty() {
        write_text_element(&mut writer, "Delimiter", delimiter)?;
    }
    write_text_element(
        &mut writer,
        "IsTruncated",
        if output.is_truncated { "true" } else { "false" },
    )?;

    for content in &output.contents {
        write_start(&mut writer, "Contents")?;
        write_text_element(&mut writer, "Key", &content.key)?;
        if let Some(date) = content.last_modified {
            write_text_element(&mut writer, "LastModified", &format_timestamp(date))?;
        }
        if let Some(ref etag) = content.etag {
            write_text_element(&mut writer, "ETag", &format!("\"{}\"", etag))?;
        }
        write_text_element(&mut writer, "Size", &content.size.to_string())?;
        write_end(&mut writer, "Contents")?;
    }

    for prefix in &output.common_prefixes {
        write_start(&mut writer, "CommonPrefixes")?;
        write_text_element(&mut writer, "Prefix", prefix)?;
        write_end(&mut writer, "CommonPrefixes")?;
    }

    write_end(&mut writer, "ListBucketResult")?;

    let result = writer.into_inner().into_inner();
    String::from_utf8(result)
        .map_err(|e| ObsError::Xml(format!("Failed to convert XML to UTF-8: {}", e)))
}
