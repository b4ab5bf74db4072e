//! Instructions sent to the advisory text model.

use super::schema::VideoSceneInput;

pub const STORY_CONTEXT_PLACEHOLDER: &str = "{{STORY_CONTEXT}}";

/// Prepended to every English scene suggestion so it can be used as-is
pub const CORE_INSTRUCTIONS_EN: &str = "Create a tall, vertical photorealistic image with a 9:16 aspect ratio.
The person must be standing with their feet firmly on a plausible surface (like a floor, street, or ground), not floating.
The final image must feature the person in a full-body standing pose, modeling the provided clothing product.
CRITICAL: The person's face in the final image MUST be an exact, photorealistic match to the face in the provided character image. Do not alter the facial features, structure, or expression in any way. Apply this exact face to a body with a completely new standing pose.
Use the hair from the character image.
The person must be centered and not cropped.
Output a single, high-quality image.
The scene is as follows:";

pub const CORE_INSTRUCTIONS_VI: &str = "Tạo một hình ảnh chân thực, cao, dọc với tỷ lệ 9:16.
Người phải đứng vững chân trên một bề mặt hợp lý, không lơ lửng.
Hình ảnh cuối cùng phải có một người trong tư thế đứng toàn thân, làm mẫu cho sản phẩm quần áo được cung cấp.
CỰC KỲ QUAN TRỌNG: Khuôn mặt phải khớp chính xác với khuôn mặt trong ảnh nhân vật được cung cấp.
Sử dụng mái tóc từ hình ảnh nhân vật.
Người phải ở trung tâm và không bị cắt xén.
Xuất ra một hình ảnh duy nhất, chất lượng cao.
Bối cảnh như sau:";

pub const DEFAULT_VIDEO_PROMPT_STRUCTURE: &str = "You are an expert film director and a prompt engineer for text-to-video models.
Write one professional video prompt (in English) for each scene below. Every prompt MUST follow this 7-part structure.

The overall story context is:
\"\"\"
{{STORY_CONTEXT}}
\"\"\"

Each scene comes with a description, a starting image and an ending image. Describe the transformation between the two images with the story in mind.

1. Main Subject: the same subject as in the reference image, without re-describing them.
2. Action / Movement: the action between the start and end frames, using clear, gentle verbs.
3. Camera Movement: the virtual camera's motion, e.g. a slow dolly-in or a smooth orbit.
4. Camera Angle / Shot Type: e.g. a medium shot at eye level or a close-up with shallow depth of field.
5. Lighting & Color Mood: lighting that matches the source images and the story's tone.
6. Emotion & Atmosphere: the feeling of the scene.
7. Composition & Consistency: keep the same composition, framing and background as the input image, and do not alter the person's appearance or outfit beyond the described movement.

OUTPUT FORMAT:
Return ONLY a valid JSON array of strings, one complete prompt per scene, in the same order as the scenes.

Here are the scenes:
";

/// Four creative scene descriptions for a product and character pair
pub fn scene_suggestion_prompt(references: &str) -> String {
    let mut prompt = String::from(
        "You are a creative director. Generate 4 distinct, creative scene descriptions that will later be appended to a technical prompt.

Instructions:
1. Analyze the provided model and clothing product.
2. For each suggestion describe ONLY the creative scene: a specific, visually appealing setting, a natural full-body pose, professional lighting and a mood.
3. Do NOT include technical details such as aspect ratio, photorealism, framing or face matching. Those are added automatically.
4. Write each description in English, then provide a natural Vietnamese translation.
5. Return ONLY a valid JSON array of 4 objects with the keys \"en\" and \"vi\".
",
    );

    let references = references.trim();
    if references.is_empty() {
        prompt.push_str(
            "\nCreative Freedom:\nNo themes were given; invent themes that suit the product and model.\n",
        );
    } else {
        prompt.push_str(&format!(
            "\nMandatory Themes:\nIncorporate these user-provided themes and styles: \"{}\".\n",
            references
        ));
    }
    prompt
}

pub fn edit_suggestion_prompt(request: &str, count: usize) -> String {
    let request = if request.trim().is_empty() {
        "general improvements"
    } else {
        request.trim()
    };
    format!(
        "You are a professional photo editing assistant.
Analyze the provided image and the user's editing request, then write {count} creative, specific and actionable editing prompts (in Vietnamese) that expand on or offer alternatives to the request.

User's request: \"{request}\"

Return ONLY a valid JSON array of {count} strings.",
        count = count,
        request = request,
    )
}

pub fn story_analysis_prompt(story: &str) -> String {
    format!(
        "You are a film director. Break the following story into key visual scenes, each imagined as a 5-8 second clip.

For each scene provide:
1. \"scene\": a one-sentence description in Vietnamese.
2. \"startPrompt\": the starting frame of the clip.
3. \"endPrompt\": the ending frame, showing clear progression from the start.

Both prompts are objects with \"en\" (concise, visual, optimized for an image model) and \"vi\" (a natural Vietnamese translation).

Return ONLY a valid JSON array of objects with the keys \"scene\", \"startPrompt\" and \"endPrompt\".

Story:
\"\"\"
{}
\"\"\"
",
        story
    )
}

/// Fill the story context into the template and append one block per scene.
/// Images are attached separately, start then end, in scene order.
pub fn video_prompt_request(template: &str, story: &str, scenes: &[VideoSceneInput]) -> String {
    let mut prompt = template.replacen(STORY_CONTEXT_PLACEHOLDER, story, 1);
    for (index, scene) in scenes.iter().enumerate() {
        let n = index + 1;
        prompt.push_str(&format!(
            "\n--- Scene {n} ---\nDescription: {}\n[START IMAGE {n}]\n[END IMAGE {n}]\n",
            scene.description,
            n = n
        ));
    }
    prompt
}
