// Shared prompt constants and the template type rendered by AiAnalysisClient.
// Each service that needs LLM calls defines its own prompts.rs alongside it.

/// Instruction shared by every extraction-style prompt.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    If any field is not present in the source, use null, an empty string or an empty list \
    as appropriate. Do not make up information.";

/// Placeholder every template must contain; filled with the expected JSON shape.
pub const SCHEMA_PLACEHOLDER: &str = "{schema}";

/// A prompt for one kind of model invocation.
///
/// `body` uses `{name}` placeholders. `{schema}` is reserved and is filled by
/// `AiAnalysisClient::invoke` from the expected output type.
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub system: &'static str,
    pub body: &'static str,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl PromptTemplate {
    /// Substitutes `{key}` placeholders in a single pass, so substituted text is
    /// never rescanned. Unknown placeholders are left untouched.
    pub fn render(&self, vars: &[(&str, &str)]) -> String {
        let mut out = String::with_capacity(self.body.len());
        let mut rest = self.body;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let value = after.find('}').and_then(|close| {
                let key = &after[..close];
                vars.iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| (*v, close))
            });
            match value {
                Some((value, close)) => {
                    out.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}
