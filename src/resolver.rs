/// Classification of a decrypted payload for the renderer.
///
/// The declared type wins when it names a supported family. Otherwise the
/// leading bytes are sniffed. Only ever call this on plaintext: ciphertext
/// has no magic number and would classify as noise.
use serde::Serialize;

const PDF_MAGIC: &[u8] = &[0x25, 0x50];
const ZIP_MAGIC: &[u8] = &[0x50, 0x4B, 0x03, 0x04];
const CFB_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolvedType {
    Pdf,
    WordOoxml,
    WordLegacy,
    Unknown,
}

impl ResolvedType {
    /// MIME type handed to the renderer.
    pub fn mime(&self) -> &'static str {
        match self {
            ResolvedType::Pdf => "application/pdf",
            ResolvedType::WordOoxml => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ResolvedType::WordLegacy => "application/msword",
            ResolvedType::Unknown => "application/octet-stream",
        }
    }
}

impl std::fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResolvedType::Pdf => "PDF",
            ResolvedType::WordOoxml => "WORD_OOXML",
            ResolvedType::WordLegacy => "WORD_LEGACY",
            ResolvedType::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Lowercase and drop parameters (`; charset=...`).
fn normalize(declared_type: &str) -> String {
    declared_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Map a declared type to a supported family, if it names one.
///
/// "pdf" anywhere means PDF. "word" means Word: OOXML when the type says
/// openxml, docx or macroEnabled. A bare Word type (`application/msword`,
/// `application/vnd.ms-word`) is ambiguous between the two containers, so
/// the payload decides; only a zip body counts as OOXML.
fn declared_family(normalized: &str, plaintext: &[u8]) -> Option<ResolvedType> {
    if normalized.contains("pdf") {
        return Some(ResolvedType::Pdf);
    }
    if normalized.contains("word") {
        if ["openxml", "docx", "macroenabled"]
            .iter()
            .any(|marker| normalized.contains(marker))
            || plaintext.starts_with(ZIP_MAGIC)
        {
            return Some(ResolvedType::WordOoxml);
        }
        return Some(ResolvedType::WordLegacy);
    }
    None
}

/// Classify by leading bytes.
pub fn sniff(plaintext: &[u8]) -> ResolvedType {
    if plaintext.starts_with(PDF_MAGIC) {
        ResolvedType::Pdf
    } else if plaintext.starts_with(ZIP_MAGIC) {
        ResolvedType::WordOoxml
    } else if plaintext.starts_with(CFB_MAGIC) {
        ResolvedType::WordLegacy
    } else {
        ResolvedType::Unknown
    }
}

/// Resolve the payload's true format.
///
/// A missing header, a generic placeholder such as `application/octet-stream`
/// and any type outside the supported families all fall through to sniffing.
pub fn resolve(declared_type: Option<&str>, plaintext: &[u8]) -> ResolvedType {
    let normalized = declared_type.map(normalize).unwrap_or_default();
    match declared_family(&normalized, plaintext) {
        Some(family) => family,
        None => sniff(plaintext),
    }
}
