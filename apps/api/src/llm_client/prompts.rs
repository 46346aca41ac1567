// Shared prompt fragments. Each service that needs LLM calls defines its own
// prompts.rs alongside it; this file only holds cross-cutting pieces.

/// System prompt that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Scoring scale shared by every readiness evaluation prompt.
pub const SCORE_SCALE_INSTRUCTION: &str = "\
    Score on an integer scale from 0 to 100, where 70 is the minimum for a candidate \
    who is ready to apply. Be honest but constructive. Feedback must be 2-4 sentences \
    addressed directly to the applicant.";

/// Fills `{key}` placeholders in one pass over the template. Inserted values are
/// never scanned again, so user text containing `{...}` stays literal. Unknown
/// braces (e.g. JSON examples) are left untouched.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let hit = values
            .iter()
            .find(|(key, _)| tail.starts_with(key) && tail[key.len()..].starts_with('}'));
        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}
