use std::sync::Arc;

use crate::tool::ToolError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFrame {
    /// Resolved location (canonical path or URL).
    pub location: String,
    pub name: String,
}

/// Recipes currently being executed, outermost first.
///
/// Frames are shared between clones; pushing yields a new stack and leaves
/// the parent's untouched, so concurrent branches never see each other.
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    frames: Arc<Vec<CallFrame>>,
}

impl CallStack {
    pub fn root(location: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            frames: Arc::new(vec![CallFrame {
                location: location.into(),
                name: name.into(),
            }]),
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[CallFrame] {
        &self.frames
    }

    pub fn contains(&self, location: &str) -> bool {
        self.frames.iter().any(|f| f.location == location)
    }

    /// Enter a recipe. Fails with the whole chain when it is already running.
    pub fn push(&self, location: &str, name: &str) -> Result<CallStack, ToolError> {
        if let Some(start) = self.frames.iter().position(|f| f.location == location) {
            let chain: Vec<&str> = self.frames[start..]
                .iter()
                .map(|f| f.name.as_str())
                .chain(std::iter::once(name))
                .collect();
            return Err(ToolError::circular(format!(
                "circular recipe dependency: {}",
                chain.join(" -> ")
            ))
            .with_details(serde_json::json!({
                "chain": chain,
                "locations": self.frames[start..].iter().map(|f| f.location.as_str()).chain(std::iter::once(location)).collect::<Vec<_>>(),
            })));
        }
        let mut frames = (*self.frames).clone();
        frames.push(CallFrame {
            location: location.to_string(),
            name: name.to_string(),
        });
        Ok(CallStack {
            frames: Arc::new(frames),
        })
    }

    /// `A -> B -> C` rendering of the stack.
    pub fn chain(&self) -> String {
        self.frames
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ToolErrorKind;

    #[test]
    fn push_detects_indirect_cycle() {
        let stack = CallStack::root("/r/a.yml", "A");
        let stack = stack.push("/r/b.yml", "B").unwrap();
        let err = stack.push("/r/a.yml", "A").unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::Circular);
        assert_eq!(err.message, "circular recipe dependency: A -> B -> A");
    }

    #[test]
    fn siblings_do_not_share_frames() {
        let root = CallStack::root("/r/a.yml", "A");
        let left = root.push("/r/b.yml", "B").unwrap();
        let right = root.push("/r/c.yml", "C").unwrap();
        assert_eq!(left.chain(), "A -> B");
        assert_eq!(right.chain(), "A -> C");
        assert_eq!(root.depth(), 1);
    }
}
