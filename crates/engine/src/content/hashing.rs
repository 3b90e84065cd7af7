use sha2::{Digest, Sha256};

use super::loader::ContentSource;

/// SHA-256 over `name\0text\0` of every source, in the given order.
pub(crate) fn fingerprint_sources(sources: &[ContentSource]) -> String {
    let mut hasher = Sha256::new();
    for source in sources {
        hasher.update(source.name.as_bytes());
        hasher.update([0u8]);
        hasher.update(source.text.as_bytes());
        hasher.update([0u8]);
    }
    to_hex_lower(&hasher.finalize())
}

fn to_hex_lower(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        use std::fmt::Write as _;
        let _ = write!(&mut output, "{byte:02x}");
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(name: &str, text: &str) -> ContentSource {
        ContentSource {
            name: name.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn fingerprint_changes_on_edit_rename_or_reorder() {
        let a = source("a.xml", "<Content/>");
        let b = source("b.xml", "<Content><Role id=\"x\" label=\"X\"/></Content>");
        let base = fingerprint_sources(&[a.clone(), b.clone()]);

        assert_eq!(base, fingerprint_sources(&[a.clone(), b.clone()]));
        assert_ne!(base, fingerprint_sources(&[b.clone(), a.clone()]));
        assert_ne!(
            base,
            fingerprint_sources(&[source("c.xml", "<Content/>"), b.clone()])
        );
        assert_ne!(
            base,
            fingerprint_sources(&[source("a.xml", "<Content> </Content>"), b])
        );
    }

    #[test]
    fn name_text_boundary_is_unambiguous() {
        let joined = fingerprint_sources(&[source("ab", "c")]);
        let split = fingerprint_sources(&[source("a", "bc")]);
        assert_ne!(joined, split);
    }
}
