use serde_json::Value;

/// A location inside a structured document.
///
/// Accepts an RFC 6901 pointer (`/a/b/0`) or the dotted form (`a.b.0`).
/// An empty path (or `/`-less empty pointer) addresses the whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocPath {
    tokens: Vec<String>,
}

impl DocPath {
    pub fn parse(input: &str) -> Result<Self, DocPathError> {
        let input = input.trim();
        if input.is_empty() || input == "." {
            return Ok(Self { tokens: Vec::new() });
        }

        if let Some(rest) = input.strip_prefix('/') {
            let mut tokens = Vec::new();
            for raw in rest.split('/') {
                tokens.push(unescape(raw)?);
            }
            return Ok(Self { tokens });
        }

        let mut tokens = Vec::new();
        for part in input.split('.') {
            if part.is_empty() {
                return Err(DocPathError::EmptySegment(input.to_string()));
            }
            tokens.push(part.to_string());
        }
        Ok(Self { tokens })
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Render as a JSON pointer, escaping `~` and `/`.
    pub fn to_pointer(&self) -> String {
        self.tokens
            .iter()
            .map(|t| format!("/{}", t.replace('~', "~0").replace('/', "~1")))
            .collect()
    }

    pub fn get<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        let mut cur = doc;
        for token in &self.tokens {
            cur = match cur {
                Value::Object(map) => map.get(token)?,
                Value::Array(arr) => arr.get(token.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(cur)
    }

    /// Write `value` at this path, creating intermediate objects as needed.
    pub fn set(&self, doc: &mut Value, value: Value) -> Result<(), DocPathError> {
        let Some((last, parents)) = self.tokens.split_last() else {
            *doc = value;
            return Ok(());
        };

        let mut cur = doc;
        for token in parents {
            if cur.is_null() {
                *cur = Value::Object(Default::default());
            }
            cur = match cur {
                Value::Object(map) => map
                    .entry(token.clone())
                    .or_insert_with(|| Value::Object(Default::default())),
                Value::Array(arr) => {
                    let idx = parse_index(token, arr.len())?;
                    &mut arr[idx]
                }
                _ => return Err(DocPathError::NotAContainer(self.to_pointer())),
            };
        }

        if cur.is_null() {
            *cur = Value::Object(Default::default());
        }
        match cur {
            Value::Object(map) => {
                map.insert(last.clone(), value);
                Ok(())
            }
            Value::Array(arr) => {
                if last == "-" {
                    arr.push(value);
                    return Ok(());
                }
                let idx = last
                    .parse::<usize>()
                    .map_err(|_| DocPathError::BadIndex(last.clone()))?;
                match idx.cmp(&arr.len()) {
                    std::cmp::Ordering::Less => arr[idx] = value,
                    std::cmp::Ordering::Equal => arr.push(value),
                    std::cmp::Ordering::Greater => {
                        return Err(DocPathError::BadIndex(last.clone()))
                    }
                }
                Ok(())
            }
            _ => Err(DocPathError::NotAContainer(self.to_pointer())),
        }
    }

    /// Remove the value at this path, returning it when present.
    pub fn remove(&self, doc: &mut Value) -> Option<Value> {
        let (last, parents) = self.tokens.split_last()?;
        let mut cur = doc;
        for token in parents {
            cur = match cur {
                Value::Object(map) => map.get_mut(token)?,
                Value::Array(arr) => arr.get_mut(token.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        match cur {
            Value::Object(map) => map.remove(last),
            Value::Array(arr) => {
                let idx = last.parse::<usize>().ok()?;
                (idx < arr.len()).then(|| arr.remove(idx))
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for DocPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_pointer())
    }
}

fn unescape(raw: &str) -> Result<String, DocPathError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return Err(DocPathError::InvalidEscape),
            }
        } else {
            out.push(ch);
        }
    }
    Ok(out)
}

fn parse_index(token: &str, len: usize) -> Result<usize, DocPathError> {
    match token.parse::<usize>() {
        Ok(i) if i < len => Ok(i),
        _ => Err(DocPathError::BadIndex(token.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocPathError {
    #[error("json pointer contains invalid escape (only ~0 and ~1 are allowed)")]
    InvalidEscape,
    #[error("path '{0}' contains an empty segment")]
    EmptySegment(String),
    #[error("array index '{0}' is out of range")]
    BadIndex(String),
    #[error("cannot descend into a scalar at '{0}'")]
    NotAContainer(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dotted_and_pointer_forms_agree() {
        let doc = json!({"a": {"b": [10, 20]}});
        let dotted = DocPath::parse("a.b.1").unwrap();
        let pointer = DocPath::parse("/a/b/1").unwrap();
        assert_eq!(dotted, pointer);
        assert_eq!(dotted.get(&doc), Some(&json!(20)));
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let mut doc = json!({});
        DocPath::parse("scripts.build").unwrap().set(&mut doc, json!("tsc")).unwrap();
        assert_eq!(doc, json!({"scripts": {"build": "tsc"}}));
    }

    #[test]
    fn escapes_round_trip() {
        let p = DocPath::parse("/a~1b/c~0d").unwrap();
        assert_eq!(p.tokens(), &["a/b".to_string(), "c~d".to_string()]);
        assert_eq!(p.to_pointer(), "/a~1b/c~0d");
        assert_eq!(DocPath::parse("/x~2"), Err(DocPathError::InvalidEscape));
    }
}
