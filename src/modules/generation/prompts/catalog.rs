//! Fixed descriptor catalogs used when the user configured nothing.

use rand::seq::SliceRandom;
use rand::Rng;

/// Scene settings picked at random for a variant-1 shot without references
pub const BACKGROUND_PROMPTS: &[&str] = &[
    "a minimalist style cafe",
    "a sun-drenched cafe with large glass windows",
    "a reading corner in a cafe",
    "a garden cafe",
    "at the counter of a modern coffee shop",
    "inside a luxurious restaurant",
    "a cozy roadside diner",
    "a modern, bright living room",
    "standing next to a large window in an apartment",
    "in a cozy bedroom",
    "a clean, tidy kitchen corner",
    "on the balcony of an apartment with a city view",
    "in a hotel hallway",
    "in an industrial-style loft apartment",
    "inside a shopping mall",
    "a modern library with tall bookshelves",
    "a contemporary art museum",
    "the lobby of a luxurious hotel",
    "in a boutique fashion store",
    "in a clean, modern subway station",
    "inside a botanical conservatory",
    "a bustling pedestrian street",
    "the sidewalk of a street in Paris/Korea",
    "in front of an artistic graffiti wall",
    "a quiet and charming little alley",
    "crossing the street at a crosswalk",
    "sitting on the steps of an old building",
    "on a rooftop with a city sunset view",
    "a park with a lush green lawn and gentle sunlight",
    "a vibrant, colorful flower garden",
    "a white sand beach with blue sea",
    "a trail in a pine forest",
    "standing by a clear, calm blue lake",
    "in the middle of a lavender or sunflower field",
    "standing on a small wooden bridge over a stream",
    "a children's playground with slides and swings",
    "a deserted schoolyard",
    "an outdoor basketball court",
    "a campsite by a lake",
    "a night market shimmering with lights",
    "at a marina",
    "a plain white studio background",
    "a concrete gray background",
    "a pastel-colored background (light pink, light blue, butter yellow)",
    "a dark-colored background (teal, burgundy)",
    "a brick wall",
    "a minimalist architectural setting",
    "a modern staircase",
    "standing in an archway",
    "a blurry bokeh background",
    "a background with sun streaks coming through a window",
    "a background with the shadow of palm or tree leaves",
];

/// Full-body pose descriptors, drawn without replacement for later variants
pub const POSE_PROMPTS: &[&str] = &[
    "standing straight, arms hanging naturally at sides, calm expression",
    "one foot slightly forward, looking directly at the camera",
    "both hands in pockets, relaxed style",
    "legs slightly apart, leaning slightly forward",
    "weight on one leg, hip slightly tilted",
    "back slightly arched, natural posture",
    "leaning to one side, one hand in pocket",
    "standing straight, one knee slightly bent",
    "both hands behind back, relaxed posture",
    "one hand in pocket, the other arm hanging naturally",
    "both hands in pants pockets",
    "one hand in back pocket, the other hand stroking hair",
    "hand in jacket pocket, cool expression",
    "both hands in jacket pockets, looking down",
    "stretching gently, relaxed pose",
    "arms down, looking straight ahead, strong presence",
    "hands lightly clasped in front of the stomach, elegant pose",
    "legs crossed, hand lightly touching chin",
    "legs crossed, a slight smile",
    "one leg slightly bent, toes pointing inward",
    "one arm across the chest, elegant pose",
    "lightly holding the opposite forearm",
    "arms slightly folded in front of the chest, comfortable",
    "hands gently in front of the stomach, graceful posture",
    "standing sideways, looking into the distance, calm pose",
    "hands touching in front, standard studio pose",
    "one leg back, straight posture",
    "one hand holding the other wrist",
    "slight lean, side lighting",
    "arms relaxed, calm gaze",
    "standing still, head slightly tilted, confident aura",
    "one hand touching the neck, gaze directed upwards",
    "adjusting the sleeves with both hands",
    "one hand gently stroking hair",
    "lightly holding the hem of a shirt or jacket",
    "one hand holding the collar",
    "one hand on chest, gentle gaze",
    "fingers lightly touching the chin, thoughtful expression",
    "both hands in front as if holding a small object",
    "one hand lightly touching the cheek",
    "hand on the opposite shoulder",
    "both hands behind the head, free-spirited pose",
    "one arm extended forward",
    "one hand in pocket, the other touching the chin",
    "one arm raised as if touching the light",
    "standing diagonally, looking down at the hand",
    "hand behind the head, natural pose",
    "one hand lightly lifting the hem of the clothing",
    "hand on chest, peaceful expression",
    "turning halfway to the side, looking back",
    "captured mid-stride, natural walking pose",
    "slight upper body twist, one arm raised high",
    "slight turn, clothes moving naturally",
    "one arm raised as if waving",
    "turning head quickly towards the camera",
    "stepping forward, focused gaze",
    "slight turn, shirt or skirt gently flowing",
    "striding forward, wind gently blowing the clothes",
    "standing with a diagonal twist, motion pose",
    "one arm swinging slightly, hair in motion",
    "a slight hip pop pose",
    "stepping sideways, gaze following the direction of the step",
    "three-quarter turn, arm slightly raised",
    "a pose as if in transition between steps",
    "slight turn of head and hips in opposite directions",
    "arms slightly spread as if embracing the wind",
    "a pose as if paused mid-walk",
    "arms crossed in front of the chest, confident expression",
    "leaning back slightly, arms crossed",
    "both hands on hips, powerful stance",
    "one arm raised high above the head",
    "arms slightly open to the sides",
    "one arm extended horizontally at shoulder level",
    "one hand on hip",
    "leaning to one side, hand on thigh",
    "hip twist, both hands on hips",
    "stepping back slightly, confident expression",
    "one leg bent, arms balancing",
    "standing with back turned, looking over the shoulder",
    "looking over the shoulder, one hand in pocket",
    "standing straight, head slightly bowed",
    "looking to the side",
    "one foot on tiptoe, head turned to the side",
    "chin slightly raised, confident gaze",
    "head tilted to the side, slight smile",
    "looking down at the floor, natural look",
    "looking far to the left",
    "looking back, playful expression",
    "looking over the shoulder towards the camera",
    "slight bow of the head, serious gaze",
    "looking up at the sky, dreamy expression",
    "head slightly tilted, relaxed face",
    "straight posture, neutral gaze",
    "standing sideways, eyes closed, wind in hair",
];

/// Fallback once an item's pose pool is used up
pub const POSE_VARIATION_PROMPTS: &[&str] = &[
    "change the camera angle slightly, for example a lower or higher angle",
    "use a slightly different, more dynamic full-body standing pose",
    "show a different facial expression, like a subtle smile or a more thoughtful look",
    "shift the body weight to the other leg for a new, natural pose",
    "turn the body slightly away from or towards the camera",
    "change the model's head tilt slightly",
    "try a pose with one hand on the hip or in a pocket",
    "capture the model as if they are in the middle of a natural movement",
];

pub fn random_background() -> &'static str {
    pick(BACKGROUND_PROMPTS)
}

pub fn random_pose_variation() -> &'static str {
    pick(POSE_VARIATION_PROMPTS)
}

fn pick(catalog: &'static [&'static str]) -> &'static str {
    catalog.choose(&mut rand::thread_rng()).copied().unwrap_or_default()
}

/// The remote `generationConfig.seed` is an int32
pub const MAX_SEED: u64 = i32::MAX as u64;

/// Random seed in the range the remote model accepts comfortably
pub fn random_seed() -> u64 {
    rand::thread_rng().gen_range(0..100_000)
}

/// Per-item pose pool. Every descriptor of the catalog is handed out once,
/// in random order, before falling back to the variation list.
#[derive(Debug, Clone)]
pub struct PosePool {
    remaining: Vec<&'static str>,
}

impl PosePool {
    pub fn shuffled() -> Self {
        Self::from_catalog(POSE_PROMPTS)
    }

    pub fn from_catalog(catalog: &[&'static str]) -> Self {
        let mut remaining = catalog.to_vec();
        remaining.shuffle(&mut rand::thread_rng());
        Self { remaining }
    }

    /// Next unused descriptor, `None` once the pool is exhausted
    pub fn take(&mut self) -> Option<&'static str> {
        self.remaining.pop()
    }

    pub fn take_or_fallback(&mut self) -> &'static str {
        self.take().unwrap_or_else(random_pose_variation)
    }

    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalogs_have_no_duplicates() {
        let backgrounds: HashSet<_> = BACKGROUND_PROMPTS.iter().collect();
        assert_eq!(backgrounds.len(), BACKGROUND_PROMPTS.len());
        assert_eq!(POSE_VARIATION_PROMPTS.len(), 8);
    }

    #[test]
    fn test_pose_pool_hands_out_each_entry_once() {
        let mut pool = PosePool::from_catalog(&["a", "b", "c"]);
        let drawn: HashSet<_> = (0..3).filter_map(|_| pool.take()).collect();
        assert_eq!(drawn.len(), 3);
        assert_eq!(pool.take(), None);
        assert!(POSE_VARIATION_PROMPTS.contains(&pool.take_or_fallback()));
    }

    #[test]
    fn test_random_picks_come_from_catalog() {
        assert!(BACKGROUND_PROMPTS.contains(&random_background()));
        assert!(random_seed() < 100_000);
    }
}
