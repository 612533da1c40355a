use crate::models::HomeSpecifications;
use crate::validation::parse_number;

/// Ordered amenity phrases for the prompt.
pub fn feature_list(specs: &HomeSpecifications, other_features: &str) -> Vec<String> {
    let mut features = Vec::new();
    if specs.kitchen.is_yes() {
        features.push("kitchen".to_string());
    }
    if specs.living_room.is_yes() {
        features.push("living room".to_string());
    }
    if specs.study_room.is_yes() {
        features.push("study room".to_string());
    }
    // Whole balconies only: "0.5" counts as none.
    if parse_number(&specs.balconies).is_some_and(|n| n.trunc() > 0.0) {
        features.push(format!("{} balcony/balconies", specs.balconies));
    }
    if specs.garden.is_yes() {
        features.push("garden".to_string());
    }
    if !other_features.is_empty() {
        features.push(other_features.to_string());
    }
    features
}

pub fn render_features(specs: &HomeSpecifications, other_features: &str) -> String {
    let features = feature_list(specs, other_features);
    if features.is_empty() {
        "None".to_string()
    } else {
        features.join(", ")
    }
}

/// Builds the floor-plan prompt. User text is interpolated verbatim.
pub fn build_prompt(vision: &str, specs: &HomeSpecifications, other_features: &str) -> String {
    let features = render_features(specs, other_features);
    format!(
        "Generate a high-contrast, minimalistic black and white 2D architectural floor plan. The style must be a professional architectural drawing with clean lines and clear labels, on a plain white background.\n\
Strictly follow these user-provided specifications and do not add any extra elements:\n\
- Total Area: {area} sq ft.\n\
- Bedrooms: {bedrooms}.\n\
- Bathrooms: {bathrooms}.\n\
- Floors: {floors}.\n\
- Ceiling Height: {ceiling} ft.\n\
- Other required features: {features}.\n\
- General architectural style/vision: \"{vision}\".\n\
\n\
The final layout must be clean and properly labeled with room names (e.g., \"BEDROOM\", \"LIVING ROOM\", \"BATH\") and their corresponding dimensions (e.g., \"Living Room: 15'x20'\", \"Bedroom: 12'x12'\"). Clearly mark all walls, doors, and windows. Include overall measurements and individual room dimensions directly on the plan.\n\
The entire image output must be just the black and white floor plan on a plain white background. Do not include any colors, shadows, 3D elements, or watermarks.",
        area = specs.total_area,
        bedrooms = specs.bedrooms,
        bathrooms = specs.bathrooms,
        floors = specs.floors,
        ceiling = specs.ceiling_height,
    )
}
