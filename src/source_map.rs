//! Source Map Generation
//!
//! Implements Source Map v3 for mapping translated JavaScript back to the
//! original TypeScript source.
//!
//! Format: https://sourcemaps.info/spec.html

use serde::Serialize;

/// A single mapping from generated position to original position
#[derive(Debug, Clone)]
pub struct Mapping {
    /// Generated line (0-indexed)
    pub generated_line: u32,
    /// Generated column (0-indexed)
    pub generated_column: u32,
    /// Source file index
    pub source_index: u32,
    /// Original line (0-indexed)
    pub original_line: u32,
    /// Original column (0-indexed)
    pub original_column: u32,
}

/// Source Map v3 output format
#[derive(Debug, Serialize)]
pub struct SourceMap {
    pub version: u32,
    pub file: String,
    #[serde(rename = "sourceRoot")]
    pub source_root: String,
    pub sources: Vec<String>,
    #[serde(rename = "sourcesContent")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<String>>,
    pub names: Vec<String>,
    pub mappings: String,
}

/// Builder for source maps
#[derive(Debug)]
pub struct SourceMapGenerator {
    file: String,
    sources: Vec<String>,
    sources_content: Vec<Option<String>>,
    mappings: Vec<Mapping>,
}

impl SourceMapGenerator {
    pub fn new(file: String) -> Self {
        SourceMapGenerator {
            file,
            sources: Vec::new(),
            sources_content: Vec::new(),
            mappings: Vec::new(),
        }
    }

    /// Add a source file
    pub fn add_source(&mut self, source: String) -> u32 {
        let index = self.sources.len() as u32;
        self.sources.push(source);
        self.sources_content.push(None);
        index
    }

    /// Add a source file with content
    pub fn add_source_with_content(&mut self, source: String, content: String) -> u32 {
        let index = self.sources.len() as u32;
        self.sources.push(source);
        self.sources_content.push(Some(content));
        index
    }

    /// Add a mapping
    pub fn add_mapping(
        &mut self,
        generated_line: u32,
        generated_column: u32,
        source_index: u32,
        original_line: u32,
        original_column: u32,
    ) {
        self.mappings.push(Mapping {
            generated_line,
            generated_column,
            source_index,
            original_line,
            original_column,
        });
    }

    /// Number of recorded mappings.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Generate the source map
    pub fn generate(&mut self) -> SourceMap {
        self.mappings.sort_by(|a, b| {
            if a.generated_line != b.generated_line {
                a.generated_line.cmp(&b.generated_line)
            } else {
                a.generated_column.cmp(&b.generated_column)
            }
        });

        let mappings_str = self.encode_mappings();

        let sources_content = if self.sources_content.iter().any(|c| c.is_some()) {
            Some(
                self.sources_content
                    .iter()
                    .map(|c| c.clone().unwrap_or_default())
                    .collect(),
            )
        } else {
            None
        };

        SourceMap {
            version: 3,
            file: self.file.clone(),
            source_root: String::new(),
            sources: self.sources.clone(),
            sources_content,
            names: Vec::new(),
            mappings: mappings_str,
        }
    }

    /// Generate source map as JSON string
    pub fn generate_json(&mut self) -> String {
        let map = self.generate();
        serde_json::to_string(&map).unwrap_or_default()
    }

    /// Encode mappings using VLQ base64, delta-encoded per the spec.
    fn encode_mappings(&self) -> String {
        let mut result = String::new();
        let mut prev_generated_line = 0u32;
        let mut prev_generated_column = 0i64;
        let mut prev_source_index = 0i64;
        let mut prev_original_line = 0i64;
        let mut prev_original_column = 0i64;
        let mut first_on_line = true;

        for mapping in &self.mappings {
            while prev_generated_line < mapping.generated_line {
                result.push(';');
                prev_generated_line += 1;
                prev_generated_column = 0;
                first_on_line = true;
            }
            if !first_on_line {
                result.push(',');
            }
            first_on_line = false;

            encode_vlq(
                &mut result,
                mapping.generated_column as i64 - prev_generated_column,
            );
            prev_generated_column = mapping.generated_column as i64;

            encode_vlq(&mut result, mapping.source_index as i64 - prev_source_index);
            prev_source_index = mapping.source_index as i64;

            encode_vlq(
                &mut result,
                mapping.original_line as i64 - prev_original_line,
            );
            prev_original_line = mapping.original_line as i64;

            encode_vlq(
                &mut result,
                mapping.original_column as i64 - prev_original_column,
            );
            prev_original_column = mapping.original_column as i64;
        }
        result
    }
}

const BASE64_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Encode one signed value as base64 VLQ.
fn encode_vlq(out: &mut String, value: i64) {
    let mut vlq = if value < 0 {
        (((-value) as u64) << 1) | 1
    } else {
        (value as u64) << 1
    };
    loop {
        let mut digit = (vlq & 0b11111) as usize;
        vlq >>= 5;
        if vlq != 0 {
            digit |= 0b100000;
        }
        out.push(BASE64_CHARS[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vlq_encoding() {
        let mut out = String::new();
        encode_vlq(&mut out, 0);
        assert_eq!(out, "A");
        out.clear();
        encode_vlq(&mut out, 1);
        assert_eq!(out, "C");
        out.clear();
        encode_vlq(&mut out, -1);
        assert_eq!(out, "D");
        out.clear();
        encode_vlq(&mut out, 16);
        assert_eq!(out, "gB");
    }

    #[test]
    fn test_simple_map() {
        let mut generator = SourceMapGenerator::new("out.js".to_string());
        generator.add_source("in.ts".to_string());
        generator.add_mapping(0, 0, 0, 0, 0);
        generator.add_mapping(1, 0, 0, 2, 4);
        let map = generator.generate();
        assert_eq!(map.version, 3);
        assert_eq!(map.sources, vec!["in.ts"]);
        assert_eq!(map.mappings, "AAAA;AAEI");
    }

    #[test]
    fn test_json_round_trip_fields() {
        let mut generator = SourceMapGenerator::new("out.js".to_string());
        generator.add_source_with_content("in.ts".to_string(), "var x;".to_string());
        generator.add_mapping(0, 0, 0, 0, 0);
        let json = generator.generate_json();
        assert!(json.contains("\"version\":3"));
        assert!(json.contains("sourcesContent"));
    }
}
