use oeis_common::{EdgeTriple, SeqId};

/// One record parsed from the OEIS internal-format line-tagged text file.
/// Any subset of tags may be absent.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeqRecord {
    pub id: Option<SeqId>,
    pub description: Option<String>,
    pub authors: Vec<String>,
    pub references: Vec<String>,
}

/// Parse the single-letter line tags of a `.seq` file:
/// `%I` identifier, `%N` description, `%A` author, `%D` reference.
/// Unknown tags are ignored; every field is optional.
pub fn parse_seq_record(content: &str) -> SeqRecord {
    let mut record = SeqRecord::default();

    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("%I") {
            if record.id.is_none() {
                record.id = rest.split_whitespace().next().and_then(SeqId::parse);
            }
        } else if let Some(rest) = line.strip_prefix("%N") {
            if record.description.is_none() {
                let text = strip_leading_id(rest);
                if !text.is_empty() {
                    record.description = Some(text);
                }
            }
        } else if let Some(rest) = line.strip_prefix("%A") {
            let author = strip_leading_id(rest);
            if !author.is_empty() {
                record.authors.push(author);
            }
        } else if let Some(rest) = line.strip_prefix("%D") {
            let reference = strip_leading_id(rest);
            if !reference.is_empty() {
                record.references.push(reference);
            }
        }
    }

    record
}

/// Tag lines repeat the identifier after the tag (`%N A000001 Number of ...`).
/// Drop that token when present and return the remaining text.
fn strip_leading_id(rest: &str) -> String {
    let trimmed = rest.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, tail)) if SeqId::parse(first).is_some() => tail.trim().to_string(),
        _ => trimmed.to_string(),
    }
}

impl SeqRecord {
    /// Lower the record into edge triples through the same write path the
    /// scraped pages use: the description as a HAS_DESCRIPTION edge, then
    /// one edge per author and reference. The record's own `%I` identifier
    /// wins over the identifier the file was queued under.
    pub fn into_triples(self, fallback_id: &SeqId) -> Vec<EdgeTriple> {
        let from_id = self.id.unwrap_or_else(|| fallback_id.clone());
        let mut triples = Vec::with_capacity(
            usize::from(self.description.is_some()) + self.authors.len() + self.references.len(),
        );

        if let Some(description) = self.description {
            triples.push(EdgeTriple {
                from_id: from_id.clone(),
                to_id: description,
                relationship: "HAS_DESCRIPTION".to_string(),
            });
        }
        for author in self.authors {
            triples.push(EdgeTriple {
                from_id: from_id.clone(),
                to_id: author,
                relationship: "HAS_AUTHOR".to_string(),
            });
        }
        for reference in self.references {
            triples.push(EdgeTriple {
                from_id: from_id.clone(),
                to_id: reference,
                relationship: "HAS_REFERENCE".to_string(),
            });
        }

        triples
    }
}
