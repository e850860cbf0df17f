pub const SCENE_DESCRIPTION: &str = include_str!("../data/prompts/scene_description.txt");
pub const CAT_GENERATION: &str = include_str!("../data/prompts/cat_generation.txt");

/// Substitute each `{{key}}` in `template`; unknown placeholders are left as is.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// Stage-2 prompt: the scene description is embedded verbatim.
pub fn generation_prompt(description: &str) -> String {
    render(CAT_GENERATION, &[("description", description)])
}
