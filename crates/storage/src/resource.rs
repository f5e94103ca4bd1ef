//! Fetched resources, as handed over by the crawler.

/// A resource body fetched from the network.
pub trait FetchedResource {
    /// The URI the resource was fetched from.
    fn source_uri(&self) -> &str;

    /// Filename suggested by the server through `Content-Disposition`, already
    /// decoded and stripped of any directory components.
    fn disposition_filename(&self) -> Option<String>;

    /// The body, if one was received.
    fn content(&self) -> Option<&[u8]>;
}

/// A plain fetched page: a URI, the raw `Content-Disposition` header (if the
/// server sent one) and the body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPage {
    uri: String,
    content_disposition: Option<String>,
    content: Option<Vec<u8>>,
}
impl FetchedPage {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into(), ..Self::default() }
    }

    pub fn with_content(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_content_disposition(mut self, header: impl Into<String>) -> Self {
        self.content_disposition = Some(header.into());
        self
    }
}
impl FetchedResource for FetchedPage {
    fn source_uri(&self) -> &str {
        &self.uri
    }

    fn disposition_filename(&self) -> Option<String> {
        self.content_disposition.as_deref().and_then(disposition_filename)
    }

    fn content(&self) -> Option<&[u8]> {
        self.content.as_deref()
    }
}

/// Extract the filename from a `Content-Disposition` header value.
///
/// The RFC 5987 extended form (`filename*=UTF-8''na%C3%AFve.pdf`) wins over
/// the plain form (`filename="naive.pdf"`). Directory components are
/// dropped so a hostile server can't pick where the file lands.
///
/// ```
/// use scent_storage::resource::disposition_filename;
/// assert_eq!(disposition_filename(r#"attachment; filename="report.pdf""#).as_deref(), Some("report.pdf"));
/// assert_eq!(disposition_filename("inline").as_deref(), None);
/// ```
pub fn disposition_filename(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;
    for param in split_params(header).into_iter().skip(1) {
        let Some((name, value)) = param.split_once('=') else { continue };
        match name.trim().to_ascii_lowercase().as_str() {
            "filename*" => extended = decode_extended(value.trim()),
            "filename" => plain = Some(unquote(value.trim())),
            _ => {},
        }
    }
    extended.or(plain).and_then(|name| basename(&name))
}

/// Split on `;` outside of quoted strings.
fn split_params(header: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let (mut start, mut quoted, mut escaped) = (0, false, false);
    for (i, c) in header.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ';' if !quoted => {
                params.push(&header[start..i]);
                start = i + 1;
            },
            _ => {},
        }
    }
    params.push(&header[start..]);
    params
}

fn unquote(value: &str) -> String {
    match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => {
            let mut out = String::with_capacity(inner.len());
            let mut chars = inner.chars();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => out.extend(chars.next()),
                    c => out.push(c),
                }
            }
            out
        },
        None => value.to_string(),
    }
}

/// `charset'language'percent-encoded`
fn decode_extended(value: &str) -> Option<String> {
    let mut parts = value.splitn(3, '\'');
    let (charset, _language, encoded) = (parts.next()?, parts.next()?, parts.next()?);
    let bytes = urlencoding::decode_binary(encoded.as_bytes());
    match charset.to_ascii_lowercase().as_str() {
        "utf-8" => String::from_utf8(bytes.into_owned()).ok(),
        "iso-8859-1" => Some(bytes.iter().copied().map(char::from).collect()),
        _ => None,
    }
}

fn basename(name: &str) -> Option<String> {
    let name = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    match name {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}
