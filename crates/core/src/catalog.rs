//! Pose instructions, edit presets and the prompts sent to the image model.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::wardrobe::{GarmentCategory, WardrobeItem};

/// Pose catalogue. Each entry is both the cache key for a layer's pose image
/// and the instruction given to the image model.
pub const POSE_INSTRUCTIONS: [&str; 6] = [
    "Full frontal view, hands on hips",
    "Slightly turned, 3/4 view",
    "Side profile view",
    "Jumping in the air, mid-action shot",
    "Walking towards camera",
    "Leaning against a wall",
];

/// Validated index into [`POSE_INSTRUCTIONS`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct PoseIndex(usize);

impl PoseIndex {
    /// The default pose, used for every freshly finalized model.
    pub const FRONT: Self = Self(0);

    /// Returns `None` if `index` is outside the catalogue.
    #[must_use]
    pub const fn new(index: usize) -> Option<Self> {
        if index < POSE_INSTRUCTIONS.len() {
            Some(Self(index))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }

    /// The pose instruction text.
    #[must_use]
    pub fn instruction(self) -> &'static str {
        POSE_INSTRUCTIONS.get(self.0).copied().unwrap_or(POSE_INSTRUCTIONS[0])
    }
}

impl TryFrom<usize> for PoseIndex {
    type Error = String;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::new(index).ok_or_else(|| format!("pose index {index} out of range"))
    }
}

impl From<PoseIndex> for usize {
    fn from(index: PoseIndex) -> Self {
        index.0
    }
}

impl fmt::Display for PoseIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.instruction())
    }
}

/// Solid studio backdrop colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackdropColor {
    LightGray,
    White,
    Beige,
    Charcoal,
    SkyBlue,
    SageGreen,
}

impl BackdropColor {
    const fn description(self) -> &'static str {
        match self {
            Self::LightGray => "light gray (#f0f0f0)",
            Self::White => "white",
            Self::Beige => "beige (#f5f5dc)",
            Self::Charcoal => "charcoal (#36454F)",
            Self::SkyBlue => "sky blue (#87CEEB)",
            Self::SageGreen => "sage green (#B2AC88)",
        }
    }
}

/// Location backdrops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scene {
    City,
    Beach,
    Cafe,
    Loft,
    Office,
    Gallery,
}

impl Scene {
    const fn prompt(self) -> &'static str {
        match self {
            Self::City => {
                "Place the person on a bustling, realistic city street at golden hour, with soft light and blurred background buildings."
            }
            Self::Beach => {
                "Place the person on a serene, photorealistic sandy beach with gentle waves and a clear blue sky."
            }
            Self::Cafe => {
                "Place the person inside a cozy, modern cafe with warm lighting and a softly blurred interior background."
            }
            Self::Loft => {
                "Place the person in a modern, sun-drenched studio loft with large windows and a clean, minimalist aesthetic."
            }
            Self::Office => {
                "Place the person in a sleek, modern office environment with a professional and blurred background."
            }
            Self::Gallery => {
                "Place the person in a bright, minimalist art gallery with abstract paintings softly blurred on the walls."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:5")]
    Portrait,
}

impl AspectRatio {
    const fn label(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait => "4:5",
        }
    }

    const fn description(self) -> &'static str {
        match self {
            Self::Square => "1:1 square",
            Self::Portrait => "4:5 portrait",
        }
    }
}

/// Passport photo background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassportBackground {
    White,
    Red,
}

/// In-place edit of the displayed image. Every variant costs one credit and
/// overwrites the current pose render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EditInstruction {
    Backdrop(BackdropColor),
    Scene(Scene),
    AspectRatio(AspectRatio),
    Headshot,
    Passport(PassportBackground),
    /// Free-form instruction typed by the user.
    Remix(String),
}

impl EditInstruction {
    /// Whether the instruction has nothing to do (a blank remix).
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Remix(text) if text.trim().is_empty())
    }

    /// Prompt sent to the image model.
    #[must_use]
    pub fn prompt(&self) -> String {
        match self {
            Self::Backdrop(color) => format!(
                "Change the background to a clean, solid {} studio backdrop.",
                color.description()
            ),
            Self::Scene(scene) => scene.prompt().to_owned(),
            Self::AspectRatio(ratio) => format!(
                "Regenerate the entire image to fit a {} aspect ratio. Do not crop the person; redraw the scene to fit the new dimensions naturally.",
                ratio.description()
            ),
            Self::Headshot => HEADSHOT_PROMPT.to_owned(),
            Self::Passport(background) => passport_prompt(*background),
            Self::Remix(text) => edit_prompt(text.trim()),
        }
    }

    /// Activity message shown while the edit runs.
    #[must_use]
    pub fn activity_message(&self) -> String {
        match self {
            Self::Backdrop(_) | Self::Scene(_) => "Changing the scene...".to_owned(),
            Self::AspectRatio(ratio) => format!("Changing aspect ratio to {}...", ratio.label()),
            Self::Headshot => "Generating Professional Headshot...".to_owned(),
            Self::Passport(_) => "Generating Passport Photo...".to_owned(),
            Self::Remix(_) => "Remixing your style...".to_owned(),
        }
    }
}

const HEADSHOT_PROMPT: &str = "You are an expert AI portrait photographer. Transform the person in this image into a professional headshot suitable for a corporate profile or social media. **Crucial Rules:** 1. The photo should be a head-and-shoulders shot. 2. The person can have a slight, professional smile. 3. The background should be a clean, modern, and subtly blurred professional setting (like an office or a neutral studio backdrop). 4. The lighting should be flattering and professional. Return ONLY the final image.";

fn passport_prompt(background: PassportBackground) -> String {
    let color = match background {
        PassportBackground::White => "white",
        PassportBackground::Red => "red",
    };
    format!(
        "You are an expert AI photo generator specializing in official documents. Transform the person in this image into a standard passport-style photograph. **Crucial Rules:** 1. The photo MUST be a front-facing, head-and-shoulders shot with a neutral expression. 2. The background MUST be a solid, uniform {color} color. 3. Remove any hats, non-prescription glasses, or distracting accessories. 4. The lighting must be even and professional, without shadows on the face or background. 5. The final image aspect ratio should be close to 3:4 (width:height). Return ONLY the final image."
    )
}

// =============================================================================
// Generation prompts
// =============================================================================

/// Prompt turning an uploaded photo into the base model image.
pub const MODEL_PROMPT: &str = "You are an expert fashion photographer AI. Transform the person in this image into a full-body fashion model photo suitable for an e-commerce website. The background must be a clean, neutral studio backdrop (light gray, #f0f0f0). The person should have a neutral, professional model expression. Preserve the person's identity, unique features, and body type, but place them in a standard, relaxed standing model pose. The final image must be photorealistic. Return ONLY the final image.";

const CLOTHING_TRY_ON_PROMPT: &str = "You are an expert virtual try-on AI. You will be given a 'model image' and a 'garment image'. Your task is to create a new photorealistic image where the person from the 'model image' is wearing the clothing from the 'garment image'.

**Crucial Rules:**
1.  **Complete Garment Replacement:** You MUST completely REMOVE and REPLACE the clothing item worn by the person in the 'model image' with the new garment. No part of the original clothing (e.g., collars, sleeves, patterns) should be visible in the final image.
2.  **Preserve the Model:** The person's face, hair, body shape, and pose from the 'model image' MUST remain unchanged.
3.  **Preserve the Background:** The entire background from the 'model image' MUST be preserved perfectly.
4.  **Apply the Garment:** Realistically fit the new garment onto the person. It should adapt to their pose with natural folds, shadows, and lighting consistent with the original scene.
5.  **Output:** Return ONLY the final, edited image. Do not include any text.";

const ACCESSORY_TRY_ON_PROMPT: &str = "You are an expert virtual try-on AI for accessories. You will be given a 'model image' and an 'accessory image'. Your task is to create a new photorealistic image where the person from the 'model image' is now wearing the item from the 'accessory image'.

**Crucial Rules:**
1.  **ADD the Accessory:** Realistically place the accessory on the person. It should integrate naturally with their existing outfit and pose (e.g., a necklace should go around their neck, sunglasses on their face).
2.  **Do NOT Replace Clothing:** The person's existing clothing MUST remain unchanged.
3.  **Preserve the Model & Background:** The person's face, hair, body shape, pose, and the background from the 'model image' MUST be perfectly preserved.
4.  **Output:** Return ONLY the final, edited image. Do not include any text.";

/// Prompt for dressing the model in `garment`. Accessories are added on top;
/// any other category replaces the current clothing.
#[must_use]
pub const fn try_on_prompt(category: GarmentCategory) -> &'static str {
    if category.is_accessory() {
        ACCESSORY_TRY_ON_PROMPT
    } else {
        CLOTHING_TRY_ON_PROMPT
    }
}

/// Prompt for re-rendering the current layer from another perspective.
#[must_use]
pub fn pose_prompt(instruction: &str) -> String {
    format!(
        "You are an expert fashion photographer AI. Take this image and regenerate it from a different perspective. The person, clothing, and background style must remain identical. The new perspective should be: \"{instruction}\". Return ONLY the final image."
    )
}

/// Wrapper applied to free-form edit instructions.
#[must_use]
pub fn edit_prompt(instruction: &str) -> String {
    format!(
        "You are an expert photo editing AI. You will be given an image and a text instruction. Your task is to edit the image based on the instruction while maintaining photorealism and the core identity of the subject.
Instruction: \"{instruction}\".
Key rules:
1.  Apply the change specified in the instruction accurately.
2.  Preserve all other aspects of the image (person's identity, pose, main outfit unless specified) as closely as possible.
3.  Ensure the final image is photorealistic and high quality.
4.  Return ONLY the final, edited image. Do not include any text or commentary."
    )
}

/// Activity message while a garment is being applied.
#[must_use]
pub fn styling_message(garment: &WardrobeItem) -> String {
    format!("Styling you in: {}...", garment.name)
}

/// Activity message while a mixtape is being curated.
#[must_use]
pub fn mixtape_message(theme: &str) -> String {
    format!("Curating a \"{theme}\" look...")
}

/// Prompt asking the stylist model for a themed outfit. `items_json` is the
/// wardrobe as a pretty-printed JSON list of `{id, name, category}`.
#[must_use]
pub fn mixtape_prompt(theme: &str, items_json: &str) -> String {
    format!(
        "You are an AI fashion stylist. Based on the following list of available wardrobe items, create a stylish and coherent outfit that fits the theme: \"{theme}\".

Available Items:
{items_json}

Rules:
1.  Choose one 'clothing' item.
2.  Choose up to two 'accessory' items that complement the clothing.
3.  Prioritize creating a complete and fashionable look.
4.  Return ONLY a JSON object with a single key \"outfitIds\" which is an array of the chosen item IDs.
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_index_bounds() {
        assert_eq!(PoseIndex::new(0), Some(PoseIndex::FRONT));
        assert!(PoseIndex::new(5).is_some());
        assert!(PoseIndex::new(6).is_none());
        assert_eq!(
            PoseIndex::new(2).expect("in range").instruction(),
            "Side profile view"
        );
    }

    #[test]
    fn test_pose_index_serde_rejects_out_of_range() {
        let index: PoseIndex = serde_json::from_str("3").expect("parse");
        assert_eq!(index.get(), 3);
        assert!(serde_json::from_str::<PoseIndex>("42").is_err());
    }

    #[test]
    fn test_edit_instruction_wire_format() {
        let edit: EditInstruction =
            serde_json::from_str(r#"{"kind":"backdrop","value":"sky-blue"}"#).expect("parse");
        assert_eq!(edit, EditInstruction::Backdrop(BackdropColor::SkyBlue));
        assert!(edit.prompt().contains("sky blue (#87CEEB)"));

        let edit: EditInstruction =
            serde_json::from_str(r#"{"kind":"aspect_ratio","value":"4:5"}"#).expect("parse");
        assert_eq!(edit.activity_message(), "Changing aspect ratio to 4:5...");

        let edit: EditInstruction = serde_json::from_str(r#"{"kind":"headshot"}"#).expect("parse");
        assert_eq!(edit, EditInstruction::Headshot);
    }

    #[test]
    fn test_remix_is_wrapped_and_trimmed() {
        let edit = EditInstruction::Remix("  make it neon  ".to_string());
        assert!(!edit.is_blank());
        assert!(edit.prompt().contains("Instruction: \"make it neon\"."));
        assert!(EditInstruction::Remix("   ".to_string()).is_blank());
    }

    #[test]
    fn test_try_on_prompt_varies_by_category() {
        assert!(try_on_prompt(GarmentCategory::Accessory).contains("Do NOT Replace Clothing"));
        assert!(try_on_prompt(GarmentCategory::Clothing).contains("Complete Garment Replacement"));
        assert!(try_on_prompt(GarmentCategory::Shoes).contains("Complete Garment Replacement"));
    }

    #[test]
    fn test_passport_prompt_background() {
        let prompt = EditInstruction::Passport(PassportBackground::Red).prompt();
        assert!(prompt.contains("solid, uniform red color"));
    }
}
