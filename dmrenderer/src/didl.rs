//! Inspection minimale des métadonnées DIDL-Lite reçues avec `SetAVTransportURI`.

use quick_xml::{Error as XmlError, Reader, escape::resolve_predefined_entity, events::Event};
use tracing::{debug, warn};

/// DIDL class token a playable item must declare.
pub const AUDIO_ITEM_CLASS: &str = "object.item.audioItem";

/// Mime class handed to the playback backend for accepted items.
pub const AUDIO_MIME_CLASS: &str = "audio";

const TITLE_TAG: &[u8] = b"dc:title";

/// Vrai si les métadonnées déclarent un item audio (recherche de sous-chaîne).
pub fn is_audio_item(metadata: &str) -> bool {
    metadata.contains(AUDIO_ITEM_CLASS)
}

/// Extracts the text of the first `<dc:title>` element.
///
/// Missing or unparsable titles yield an empty string.
pub fn extract_title(metadata: &str) -> String {
    match first_title(metadata) {
        Ok(Some(title)) => title,
        Ok(None) => {
            debug!("No dc:title in metadata, using empty display name");
            String::new()
        }
        Err(e) => {
            warn!("Failed to parse DIDL-Lite metadata: {}", e);
            String::new()
        }
    }
}

fn first_title(metadata: &str) -> Result<Option<String>, XmlError> {
    let mut reader = Reader::from_str(metadata);
    let mut title: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) if title.is_none() && e.name().as_ref() == TITLE_TAG => {
                title = Some(String::new());
            }
            Event::Empty(e) if title.is_none() && e.name().as_ref() == TITLE_TAG => {
                return Ok(Some(String::new()));
            }
            Event::Text(e) => {
                if let Some(t) = title.as_mut() {
                    t.push_str(&e.decode().map_err(XmlError::Encoding)?);
                }
            }
            Event::CData(e) => {
                if let Some(t) = title.as_mut() {
                    t.push_str(&e.decode().map_err(XmlError::Encoding)?);
                }
            }
            Event::GeneralRef(e) => {
                if let Some(t) = title.as_mut() {
                    let name = e.decode().map_err(XmlError::Encoding)?;
                    push_entity(t, &name);
                }
            }
            Event::End(e) if e.name().as_ref() == TITLE_TAG => {
                if title.is_some() {
                    return Ok(title);
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

fn push_entity(out: &mut String, name: &str) {
    if let Some(value) = resolve_predefined_entity(name) {
        out.push_str(value);
        return;
    }

    let code = if let Some(hex) = name.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(dec) = name.strip_prefix('#') {
        dec.parse::<u32>().ok()
    } else {
        None
    };

    match code.and_then(char::from_u32) {
        Some(c) => out.push(c),
        None => {
            out.push('&');
            out.push_str(name);
            out.push(';');
        }
    }
}
