use std::borrow::Cow;
use std::io::Write;
use tempfile::NamedTempFile;
use uia_locator::ResolveOptions;
use uia_locator_provider_mock::{MockProvider, MockTree};

pub fn sample_provider() -> MockProvider {
    MockProvider::new(MockTree::sample().expect("sample tree"))
}

pub fn options() -> ResolveOptions {
    ResolveOptions::default()
}

pub fn write_fixture(xml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(xml.as_bytes()).expect("write fixture");
    file
}

pub fn strip_ansi(input: &str) -> Cow<'_, str> {
    if !input.contains('\u{1b}') {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars();
    loop {
        match chars.next() {
            Some('\u{1b}') => {
                for next in chars.by_ref() {
                    if next == 'm' {
                        break;
                    }
                }
            }
            Some(ch) => result.push(ch),
            None => break,
        }
    }
    Cow::Owned(result)
}
