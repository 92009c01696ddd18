//! String template rendering utilities.

pub struct TemplateVars;

impl TemplateVars {
    pub const PREFIX: &'static str = "prefix";
    pub const START_TIME: &'static str = "start_time";
    pub const PIPELINE_ID: &'static str = "pipeline_id";
    pub const TARGET_ENV: &'static str = "target_env";
}

/// Replace `{{key}}` placeholders with their values.
pub fn render(template: &str, variables: &[(&str, &str)]) -> String {
    let mut result = template.to_string();

    for (key, value) in variables {
        let placeholder = format!("{{{{{}}}}}", key);
        result = result.replace(&placeholder, value);
    }

    result
}

/// Render every element of an argument template.
pub fn render_all(templates: &[String], variables: &[(&str, &str)]) -> Vec<String> {
    templates.iter().map(|t| render(t, variables)).collect()
}
