//! Readers for the free-text answers of the extraction prompts.

use egoview_core::{EgoviewError, Result};

const DETECT_TAG: &str = "[Detect]";
const PERSPECTIVE_TAG: &str = "[Perspective]";
const PERSPECTIVE_MARKER: &str = "++";

/// `[dog, 'chair', "red car"]` into its items. `[]` is a valid empty list.
pub fn parse_object_list(output: &str) -> Result<Vec<String>> {
    let text = output.trim();
    let text = text.strip_prefix(DETECT_TAG).unwrap_or(text).trim();
    let inner = text
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| EgoviewError::parse(output, "expected a bracketed list"))?;
    if inner.contains(['[', ']']) {
        return Err(EgoviewError::parse(output, "nested lists are not allowed"));
    }
    if inner.trim().is_empty() {
        return Ok(vec![]);
    }

    inner
        .split(',')
        .map(|item| {
            let item = unquote(item.trim()).trim();
            if item.is_empty() {
                Err(EgoviewError::parse(output, "empty list item"))
            } else {
                Ok(item.to_string())
            }
        })
        .collect()
}

/// `++woman++` (optionally after `[Perspective]`), or one bare line.
pub fn parse_perspective(output: &str) -> Result<String> {
    let text = output.trim();
    let text = text.strip_prefix(PERSPECTIVE_TAG).unwrap_or(text).trim();

    let name = match text.split_once(PERSPECTIVE_MARKER) {
        Some((_, rest)) => rest
            .split_once(PERSPECTIVE_MARKER)
            .map(|(name, _)| name)
            .ok_or_else(|| EgoviewError::parse(output, "unterminated ++name++ marker"))?,
        None if text.lines().count() == 1 => text,
        None => {
            return Err(EgoviewError::parse(
                output,
                "expected ++name++ or a single line",
            ))
        }
    };

    let name = unquote(name.trim()).trim();
    if name.is_empty() {
        return Err(EgoviewError::parse(output, "empty perspective"));
    }
    Ok(name.to_string())
}

fn unquote(item: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = item
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    item
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_lists() {
        assert_eq!(parse_object_list("[airplane, person]").unwrap(), vec!["airplane", "person"]);
        assert_eq!(
            parse_object_list(" ['woman', \"red car\" ,dog] \n").unwrap(),
            vec!["woman", "red car", "dog"]
        );
        assert_eq!(parse_object_list("[Detect] [dog]").unwrap(), vec!["dog"]);
        assert!(parse_object_list("[]").unwrap().is_empty());
    }

    #[test]
    fn malformed_object_lists() {
        for output in ["dog, chair", "[dog, chair", "[[dog], chair]", "[dog,,chair]", "", "['']"] {
            assert!(
                matches!(parse_object_list(output), Err(EgoviewError::Parse { .. })),
                "{output:?} should not parse"
            );
        }
    }

    #[test]
    fn perspectives() {
        assert_eq!(parse_perspective("++woman++").unwrap(), "woman");
        assert_eq!(parse_perspective("[Perspective] ++white car++\n").unwrap(), "white car");
        assert_eq!(parse_perspective("camera").unwrap(), "camera");
        assert_eq!(parse_perspective(" 'dog' ").unwrap(), "dog");
    }

    #[test]
    fn malformed_perspectives() {
        for output in ["", "++dog", "++ ++", "the dog\nor the cat"] {
            assert!(
                matches!(parse_perspective(output), Err(EgoviewError::Parse { .. })),
                "{output:?} should not parse"
            );
        }
    }
}
