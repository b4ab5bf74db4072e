//! Instruction templates sent to the image model.

use crate::modules::generation::domain::{AspectRatio, Backdrop, CreativeMode};

pub const DEFAULT_BG_REMOVAL_PROMPT: &str = "Remove the background and the human model from this image. Only keep the clothes (t-shirt and shorts/skirt).";

pub const REFERENCE_PREFIX: &str = "Apply the following style, pose, and background details:";

pub const PRODUCT_USAGE_HINT: &str = "Analyze the provided product image and show the person interacting with it in a natural and appropriate way (e.g., wearing it if it's clothing, holding it if it's a bottle, applying it if it's cream).";

/// Fashion regeneration when the source used a background image
pub const BACKGROUND_IMAGE_INSTRUCTION: &str = "Use the provided background image for the scene...";

pub const VARIATION_REFERENCE_PREFIX: &str =
    "Apply the following style, pose, and background details, but create a different variation:";

/// Base instruction for a fashion or custom shot
pub fn base_prompt(mode: CreativeMode, ratio: AspectRatio) -> String {
    let subject = match mode {
        CreativeMode::Fashion => "The final image must feature a person in a full-body standing pose, modeling the provided clothing product.",
        CreativeMode::Custom => "The final image must feature a person.",
    };
    let visibility = match mode {
        CreativeMode::Fashion => "Ensure the clothing product is clearly visible, well-lit with professional, soft lighting, and unobstructed.",
        CreativeMode::Custom => "The person and product must be clearly visible, well-lit with professional, soft lighting, and unobstructed.",
    };
    let complement = match mode {
        CreativeMode::Fashion => "outfit",
        CreativeMode::Custom => "product",
    };

    format!(
        "Create a {orientation} photorealistic image with a {ratio} aspect ratio.
{subject}
IMPORTANT: Generate a new, natural standing pose. Do NOT copy the pose from the original character image provided.
CRITICAL: The person's face in the final image MUST be an exact, photorealistic match to the face in the provided character image. Do not alter the facial features, structure, or expression in any way. Apply this exact face to a body with a completely new standing pose.
Use the hair from the character image.
Place this person in a newly generated, suitable real-world background (like a city street, studio, or park) that complements the {complement}.
{visibility}
The overall scene must be realistic and cinematic, with accurate proportions, detailed textures, and natural skin tones.
The person must be centered and not cropped.
The person's feet must be standing firmly on a plausible surface (like a floor, street, or ground), not floating.
Output a single, high-quality image.",
        orientation = ratio.orientation(),
        ratio = ratio.as_str(),
    )
}

/// Rewrite the ratio wording of an existing (possibly user-edited) template
pub fn adapt_aspect_ratio(template: &str, ratio: AspectRatio) -> String {
    let (from_ratio, from_text) = match ratio {
        AspectRatio::Wide | AspectRatio::Landscape => ("9:16", "tall, vertical"),
        AspectRatio::Tall | AspectRatio::Portrait => ("16:9", "wide, horizontal"),
        AspectRatio::Square => return template.to_string(),
    };
    template
        .replace(from_ratio, ratio.as_str())
        .replace(from_text, ratio.orientation())
}

/// Join non-empty reference descriptors with ", "
pub fn combine_references(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn with_references(prompt: &str, references: &str) -> String {
    let references = references.trim();
    if references.is_empty() {
        prompt.to_string()
    } else {
        format!("{} {} {}.", prompt, REFERENCE_PREFIX, references)
    }
}

/// Like `with_references`, asking for a departure from the previous result
pub fn with_variation_references(prompt: &str, references: &str) -> String {
    let references = references.trim();
    if references.is_empty() {
        prompt.to_string()
    } else {
        format!("{} {} {}.", prompt, VARIATION_REFERENCE_PREFIX, references)
    }
}

pub fn with_negative(prompt: &str, negative: &str) -> String {
    let negative = negative.trim();
    if negative.is_empty() {
        prompt.to_string()
    } else {
        format!("{} Exclude: {}.", prompt, negative)
    }
}

/// Background-removal instruction for the requested backdrop
pub fn bg_removal_prompt(backdrop: Backdrop, configured: &str) -> String {
    let color = match backdrop {
        Backdrop::Transparent => return configured.to_string(),
        Backdrop::White => "white",
        Backdrop::Black => "black",
        Backdrop::Gray => "gray",
    };
    format!(
        "Remove the background and the human model from this image. Only keep the clothes. Place the product on a {} background.",
        color
    )
}

/// Later variants recreate the first variant's scene with a new pose
pub fn anchor_variant_prompt(pose_change: &str, ratio: AspectRatio) -> String {
    format!(
        "CRITICAL INSTRUCTION: A complete scene is provided as a background image. Recreate this scene EXACTLY, including the background, lighting, and style. Place the provided clothing product onto the provided character model and insert them into the scene.
IMPORTANT: Generate a completely new, natural, full-body standing pose for the character that incorporates this specific change: \"{pose}\". Do NOT copy the pose from the original character image or the pose in the provided background image.
ALSO CRITICAL: Generate a new and unique facial expression for the model, different from the previous images (e.g., a smile, a thoughtful look, a neutral expression).
CRITICAL: The person's face MUST be an exact, photorealistic match to the face in the provided character image. Do not alter it.
The final output must be a {orientation} {ratio} photorealistic image that seamlessly blends the character into the provided background scene.",
        pose = pose_change,
        orientation = ratio.orientation(),
        ratio = ratio.as_str(),
    )
}

/// Story frame conditioned on the previous frame's person
pub fn story_consistency_prompt(scene_prompt: &str, ratio: AspectRatio) -> String {
    format!(
        "**Instruction:** Create a {orientation} {ratio} image. Use the person from the provided reference image and place them in a new scene described by the prompt below.
**CRITICAL:** Maintain the person's exact appearance, face, hair, and clothing from the reference image.
**New Scene Prompt:** \"{prompt}\"",
        orientation = ratio.orientation(),
        ratio = ratio.as_str(),
        prompt = scene_prompt,
    )
}

pub fn edit_variation_prompt(prompt: &str) -> String {
    format!("{}, another different variation", prompt)
}

pub fn text_to_image_variation_prompt(prompt: &str) -> String {
    format!(
        "{}, cinematic, high detail, photorealistic, slightly different composition",
        prompt
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_prompt_mentions_ratio() {
        let wide = base_prompt(CreativeMode::Fashion, AspectRatio::Wide);
        assert!(wide.starts_with("Create a wide, horizontal photorealistic image with a 16:9"));
        let custom = base_prompt(CreativeMode::Custom, AspectRatio::Tall);
        assert!(custom.contains("complements the product"));
    }

    #[test]
    fn test_adapt_aspect_ratio_swaps_orientation() {
        let tall = base_prompt(CreativeMode::Fashion, AspectRatio::Tall);
        let adapted = adapt_aspect_ratio(&tall, AspectRatio::Wide);
        assert_eq!(adapted, base_prompt(CreativeMode::Fashion, AspectRatio::Wide));
    }

    #[test]
    fn test_references_and_negative_are_optional() {
        assert_eq!(with_references("Base.", "  "), "Base.");
        assert_eq!(
            with_references("Base.", "a garden cafe"),
            "Base. Apply the following style, pose, and background details: a garden cafe."
        );
        assert_eq!(with_negative("Base.", "hats"), "Base. Exclude: hats.");
        assert!(with_variation_references("Base.", "park").ends_with("different variation: park."));
        assert_eq!(combine_references(&["a", "", " b "]), "a, b");
    }

    #[test]
    fn test_backdrop_overrides_configured_prompt() {
        assert_eq!(bg_removal_prompt(Backdrop::Transparent, "custom"), "custom");
        assert!(bg_removal_prompt(Backdrop::Gray, "custom").ends_with("on a gray background."));
    }

    #[test]
    fn test_anchor_prompt_carries_pose_change() {
        let prompt = anchor_variant_prompt("turn slightly", AspectRatio::Tall);
        assert!(prompt.contains("\"turn slightly\""));
        assert!(prompt.contains("tall, vertical 9:16"));
    }
}
