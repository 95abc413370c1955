use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderError,
    RenderErrorReason,
};
use serde_json::Value;
use std::path::Path;

/// Register custom Handlebars helpers
pub fn register_helpers(handlebars: &mut Handlebars) {
    handlebars.register_helper("pad", Box::new(pad_helper));
    handlebars.register_helper("uppercase", Box::new(uppercase_helper));
    handlebars.register_helper("lowercase", Box::new(lowercase_helper));
    handlebars.register_helper("basename", Box::new(basename_helper));
    handlebars.register_helper("dirname", Box::new(dirname_helper));
}

fn helper_error(message: &str) -> RenderError {
    RenderError::from(RenderErrorReason::Other(message.into()))
}

fn param<'a>(h: &'a Helper, index: usize, helper: &str) -> Result<&'a Value, RenderError> {
    h.param(index)
        .map(|p| p.value())
        .ok_or_else(|| helper_error(&format!("{helper} expects {} parameter(s)", index + 1)))
}

fn string_param<'a>(h: &'a Helper, helper: &str) -> Result<&'a str, RenderError> {
    param(h, 0, helper)?
        .as_str()
        .ok_or_else(|| helper_error(&format!("{helper} expects a string")))
}

/// Zero-pad an integer to a width: `{{pad month 2}}`
fn pad_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let number = param(h, 0, "pad")?
        .as_i64()
        .ok_or_else(|| helper_error("pad expects an integer"))?;
    let width = param(h, 1, "pad")?
        .as_u64()
        .ok_or_else(|| helper_error("pad expects a width"))? as usize;

    out.write(&format!("{number:0width$}"))?;
    Ok(())
}

fn uppercase_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(&string_param(h, "uppercase")?.to_uppercase())?;
    Ok(())
}

fn lowercase_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(&string_param(h, "lowercase")?.to_lowercase())?;
    Ok(())
}

/// Last path component
fn basename_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let path = Path::new(string_param(h, "basename")?);
    if let Some(basename) = path.file_name() {
        out.write(&basename.to_string_lossy())?;
    }
    Ok(())
}

/// Everything before the last path component
fn dirname_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let path = Path::new(string_param(h, "dirname")?);
    if let Some(parent) = path.parent() {
        out.write(&parent.to_string_lossy())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(template: &str, data: Value) -> Result<String, RenderError> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        register_helpers(&mut handlebars);
        handlebars.render_template(template, &data)
    }

    #[test]
    fn test_path_helpers() {
        let data = json!({ "path": "A/2020/data_01.csv" });
        assert_eq!(render("{{basename path}}", data.clone()).unwrap(), "data_01.csv");
        assert_eq!(render("{{dirname path}}", data).unwrap(), "A/2020");
    }

    #[test]
    fn test_pad_and_case() {
        let data = json!({ "month": 3, "site": "abc" });
        assert_eq!(render("{{pad month 3}}", data.clone()).unwrap(), "003");
        assert_eq!(render("{{uppercase site}}", data).unwrap(), "ABC");
    }

    #[test]
    fn test_pad_rejects_text() {
        assert!(render("{{pad site 2}}", json!({ "site": "A" })).is_err());
    }
}
