//! ZIP and TAR containers.
//!
//! Each regular member is emitted as a `div class="package-entry"` holding
//! the member name in an `h1`, followed by the member's own body as decoded
//! through the embedded-document hook. Directories are skipped. Members
//! whose type has no decoder are skipped and listed under
//! [`keys::EMBEDDED_UNSUPPORTED`]; any other member failure aborts the
//! container.

use crate::core::context::ParseContext;
use crate::core::mime;
use crate::handlers::{Attributes, ContentHandler, XhtmlWriter};
use crate::plugins::{DocumentDecoder, Plugin};
use crate::types::{Metadata, keys};
use crate::{DocsiftError, Result};
use std::io::{Cursor, Read};
use tar::Archive as TarArchive;
use zip::ZipArchive;
use zip::result::ZipError;

/// Decoder for ZIP archives, including ZipCrypto-protected entries.
pub struct ZipDecoder;

impl ZipDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ZipDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for ZipDecoder {
    fn name(&self) -> &str {
        "zip-decoder"
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    fn description(&self) -> &str {
        "Decodes every member of a ZIP archive"
    }

    fn author(&self) -> &str {
        "docsift developers"
    }
}

impl DocumentDecoder for ZipDecoder {
    fn decode(
        &self,
        content: &[u8],
        _mime_type: &str,
        metadata: &mut Metadata,
        handler: &mut dyn ContentHandler,
        ctx: &ParseContext<'_>,
    ) -> Result<()> {
        let mut archive = ZipArchive::new(Cursor::new(content))
            .map_err(|e| DocsiftError::parsing_with_source("Failed to read ZIP archive", e))?;

        let mut writer = XhtmlWriter::new(handler);
        writer.start_document(metadata)?;

        for index in 0..archive.len() {
            let (name, size, encrypted) = {
                let entry = archive
                    .by_index_raw(index)
                    .map_err(|e| DocsiftError::parsing_with_source("Failed to read ZIP entry", e))?;
                if entry.is_dir() {
                    continue;
                }
                (entry.name().to_string(), entry.size(), entry.encrypted())
            };

            if !within_member_limit(&name, size, ctx) {
                continue;
            }

            // The header size is only a claim; the read itself is bounded too.
            let limit = ctx.max_member_size();
            let bytes = if encrypted {
                let password = ctx
                    .password_for(metadata)
                    .ok_or_else(|| DocsiftError::encrypted(format!("ZIP entry '{}' requires a password", name)))?;
                read_encrypted_entry(&mut archive, index, &name, &password, limit)?
            } else {
                let entry = archive
                    .by_index(index)
                    .map_err(|e| DocsiftError::parsing_with_source(format!("Failed to open ZIP entry '{}'", name), e))?;
                read_limited(entry, limit)
                    .map_err(|e| DocsiftError::parsing_with_source(format!("Failed to inflate ZIP entry '{}'", name), e))?
            };

            let Some(bytes) = bytes else {
                skip_oversized(&name, None, ctx);
                continue;
            };

            emit_member(&mut writer, &name, &bytes, metadata, ctx)?;
        }

        writer.end_document()
    }

    fn supported_mime_types(&self) -> &[&str] {
        &[mime::ZIP_MIME_TYPE, "application/x-zip-compressed"]
    }
}

fn read_encrypted_entry(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    index: usize,
    name: &str,
    password: &str,
    limit: u64,
) -> Result<Option<Vec<u8>>> {
    let entry = match archive.by_index_decrypt(index, password.as_bytes()) {
        Ok(entry) => entry,
        Err(ZipError::InvalidPassword) => {
            return Err(DocsiftError::encrypted(format!("Wrong password for ZIP entry '{}'", name)));
        }
        Err(e) => {
            return Err(DocsiftError::parsing_with_source(
                format!("Failed to open ZIP entry '{}'", name),
                e,
            ));
        }
    };

    // ZipCrypto's one-byte check lets some wrong passwords through; the CRC
    // check at the end of the read catches them.
    read_limited(entry, limit).map_err(|_| DocsiftError::encrypted(format!("Wrong password for ZIP entry '{}'", name)))
}

/// Decoder for uncompressed TAR archives.
pub struct TarDecoder;

impl TarDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TarDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for TarDecoder {
    fn name(&self) -> &str {
        "tar-decoder"
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    fn description(&self) -> &str {
        "Decodes every regular file in a TAR archive"
    }

    fn author(&self) -> &str {
        "docsift developers"
    }
}

impl DocumentDecoder for TarDecoder {
    fn decode(
        &self,
        content: &[u8],
        _mime_type: &str,
        metadata: &mut Metadata,
        handler: &mut dyn ContentHandler,
        ctx: &ParseContext<'_>,
    ) -> Result<()> {
        let mut archive = TarArchive::new(Cursor::new(content));
        let entries = archive
            .entries()
            .map_err(|e| DocsiftError::parsing_with_source("Failed to read TAR archive", e))?;

        let mut writer = XhtmlWriter::new(handler);
        writer.start_document(metadata)?;

        for entry in entries {
            let mut entry = entry.map_err(|e| DocsiftError::parsing_with_source("Failed to read TAR entry", e))?;
            if !entry.header().entry_type().is_file() {
                continue;
            }

            let name = entry
                .path()
                .map_err(|e| DocsiftError::parsing_with_source("Failed to read TAR entry path", e))?
                .to_string_lossy()
                .to_string();
            let size = entry.size();
            if !within_member_limit(&name, size, ctx) {
                continue;
            }

            let Some(bytes) = read_limited(&mut entry, ctx.max_member_size())
                .map_err(|e| DocsiftError::parsing_with_source(format!("Failed to read TAR entry '{}'", name), e))?
            else {
                skip_oversized(&name, None, ctx);
                continue;
            };

            emit_member(&mut writer, &name, &bytes, metadata, ctx)?;
        }

        writer.end_document()
    }

    fn supported_mime_types(&self) -> &[&str] {
        &[mime::TAR_MIME_TYPE, "application/tar"]
    }
}

fn within_member_limit(name: &str, size: u64, ctx: &ParseContext<'_>) -> bool {
    if size > ctx.max_member_size() {
        skip_oversized(name, Some(size), ctx);
        return false;
    }
    true
}

fn skip_oversized(name: &str, declared_size: Option<u64>, ctx: &ParseContext<'_>) {
    tracing::warn!(
        member = name,
        declared_size,
        limit = ctx.max_member_size(),
        "Skipping archive member over the size limit"
    );
}

/// Read at most `limit` bytes of a member; `None` when it holds more.
fn read_limited<R: Read>(reader: R, limit: u64) -> std::io::Result<Option<Vec<u8>>> {
    let mut bytes = Vec::new();
    reader.take(limit.saturating_add(1)).read_to_end(&mut bytes)?;
    Ok((bytes.len() as u64 <= limit).then_some(bytes))
}

fn emit_member(
    writer: &mut XhtmlWriter<'_>,
    name: &str,
    bytes: &[u8],
    metadata: &mut Metadata,
    ctx: &ParseContext<'_>,
) -> Result<()> {
    writer.start_element_with("div", Attributes::new().with("class", "package-entry"))?;
    writer.element("h1", name)?;

    let file_name = name.rsplit('/').next().unwrap_or(name);
    match ctx.parse_embedded(bytes, Some(file_name), writer.handler()) {
        Ok(()) => {}
        Err(DocsiftError::UnsupportedFormat { mime_type }) => {
            tracing::debug!(member = name, mime_type = %mime_type, "Skipping member without a decoder");
            metadata.add(keys::EMBEDDED_UNSUPPORTED, name);
        }
        Err(e) => return Err(e),
    }

    writer.end_element("div")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DocsiftConfig;
    use crate::core::context::EmbeddedParser;
    use crate::core::decoder_config::{DecoderConfig, StaticPasswordProvider};
    use crate::core::hints::HintBag;
    use crate::handlers::{BodyContentHandler, TextContentHandler};
    use std::io::Write;
    use std::sync::Arc;
    use zip::unstable::write::FileOptionsExt;
    use zip::write::SimpleFileOptions;

    /// Echoes `.txt` members as one paragraph; everything else is unsupported.
    struct TextOnlyParser;

    impl EmbeddedParser for TextOnlyParser {
        fn parse_embedded(
            &self,
            content: &[u8],
            hints: &HintBag,
            metadata: &mut Metadata,
            handler: &mut dyn ContentHandler,
            _ctx: &ParseContext<'_>,
        ) -> Result<String> {
            if !hints.resource_name().is_some_and(|name| name.ends_with(".txt")) {
                return Err(DocsiftError::unsupported("application/octet-stream"));
            }
            let mut writer = XhtmlWriter::new(handler);
            writer.start_document(metadata)?;
            writer.element("p", &String::from_utf8_lossy(content))?;
            writer.end_document()?;
            Ok("text/plain".to_string())
        }
    }

    fn decode(decoder: &dyn DocumentDecoder, content: &[u8], config: &DecoderConfig) -> Result<(String, Metadata)> {
        decode_with_settings(decoder, content, config, &DocsiftConfig::default())
    }

    fn decode_with_settings(
        decoder: &dyn DocumentDecoder,
        content: &[u8],
        config: &DecoderConfig,
        settings: &DocsiftConfig,
    ) -> Result<(String, Metadata)> {
        let parser = TextOnlyParser;
        let ctx = ParseContext::new(config, settings).bind_embedded_parser(&parser);
        let mut metadata = Metadata::new();
        let mut text = TextContentHandler::new();
        {
            let mut handler = BodyContentHandler::new(&mut text);
            decoder.decode(content, "application/zip", &mut metadata, &mut handler, &ctx)?;
        }
        Ok((text.into_text(), metadata))
    }

    fn zip_of(entries: &[(&str, &[u8])], password: Option<&[u8]>) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let mut options = SimpleFileOptions::default();
        if let Some(password) = password {
            options = options.with_deprecated_encryption(password).unwrap();
        }
        for (name, data) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                zip.start_file(*name, options).unwrap();
                zip.write_all(data).unwrap();
            }
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_zip_members_become_sections() {
        let archive = zip_of(&[("docs/", b""), ("docs/a.txt", b"alpha"), ("b.txt", b"beta")], None);
        let (text, metadata) = decode(&ZipDecoder::new(), &archive, &DecoderConfig::default()).unwrap();

        assert_eq!(text, "docs/a.txt\nalpha\n\nb.txt\nbeta\n\n");
        assert!(metadata.get(keys::EMBEDDED_UNSUPPORTED).is_none());
    }

    #[test]
    fn test_unsupported_members_are_listed() {
        let archive = zip_of(&[("a.txt", b"alpha"), ("blob.bin", b"\x00\x01")], None);
        let (text, metadata) = decode(&ZipDecoder::new(), &archive, &DecoderConfig::default()).unwrap();

        assert!(text.contains("alpha"));
        assert!(text.contains("blob.bin\n"));
        assert_eq!(metadata.get_all(keys::EMBEDDED_UNSUPPORTED), ["blob.bin".to_string()]);
    }

    /// Rewrite the uncompressed size of the first member in both its local
    /// header and its central directory record.
    fn understate_first_member_size(archive: &mut [u8], size: u32) {
        assert_eq!(&archive[..4], b"PK\x03\x04");
        archive[22..26].copy_from_slice(&size.to_le_bytes());
        let central = archive
            .windows(4)
            .position(|window| window == b"PK\x01\x02")
            .unwrap();
        archive[central + 24..central + 28].copy_from_slice(&size.to_le_bytes());
    }

    #[test]
    fn test_member_inflating_past_limit_is_skipped() {
        let big = vec![b'a'; 4 * 1024 * 1024];
        let mut archive = zip_of(&[("big.txt", big.as_slice()), ("small.txt", &b"kept"[..])], None);
        assert!(archive.len() < 64 * 1024);
        understate_first_member_size(&mut archive, 16);

        let settings = DocsiftConfig {
            max_document_size: 1024 * 1024,
            ..DocsiftConfig::default()
        };
        let (text, metadata) =
            decode_with_settings(&ZipDecoder::new(), &archive, &DecoderConfig::default(), &settings).unwrap();

        assert_eq!(text, "small.txt\nkept\n\n");
        assert!(metadata.get(keys::EMBEDDED_UNSUPPORTED).is_none());
    }

    #[test]
    fn test_member_over_limit_skipped_by_header_size() {
        let archive = zip_of(&[("big.txt", &[b'b'; 4096][..]), ("small.txt", &b"kept"[..])], None);
        let settings = DocsiftConfig {
            max_document_size: 1024,
            ..DocsiftConfig::default()
        };
        let (text, _) =
            decode_with_settings(&ZipDecoder::new(), &archive, &DecoderConfig::default(), &settings).unwrap();
        assert_eq!(text, "small.txt\nkept\n\n");
    }

    #[test]
    fn test_read_limited_boundary() {
        assert_eq!(read_limited(&b"four"[..], 4).unwrap().as_deref(), Some(&b"four"[..]));
        assert!(read_limited(&b"fives"[..], 4).unwrap().is_none());
    }

    #[test]
    fn test_encrypted_entry_without_password() {
        let archive = zip_of(&[("secret.txt", b"hidden")], Some(b"pw"));
        let err = decode(&ZipDecoder::new(), &archive, &DecoderConfig::default()).unwrap_err();
        assert!(matches!(err, DocsiftError::Encrypted { .. }));
    }

    #[test]
    fn test_encrypted_entry_with_password() {
        let archive = zip_of(&[("secret.txt", b"hidden")], Some(b"pw"));
        let config = DecoderConfig {
            password_provider: Some(Arc::new(StaticPasswordProvider::new("pw"))),
            ..DecoderConfig::default()
        };
        let (text, _) = decode(&ZipDecoder::new(), &archive, &config).unwrap();
        assert!(text.contains("hidden"));
    }

    #[test]
    fn test_invalid_zip_is_parsing_error() {
        let err = decode(&ZipDecoder::new(), b"PK\x03\x04 not really", &DecoderConfig::default()).unwrap_err();
        assert!(matches!(err, DocsiftError::Parsing { .. }));
    }

    #[test]
    fn test_tar_members() {
        let mut builder = tar::Builder::new(Vec::new());
        let data = b"tarred text";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, "notes/readme.txt", &data[..]).unwrap();
        let archive = builder.into_inner().unwrap();

        let (text, _) = decode(&TarDecoder::new(), &archive, &DecoderConfig::default()).unwrap();
        assert_eq!(text, "notes/readme.txt\ntarred text\n\n");
    }
}
