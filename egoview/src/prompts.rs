use egoview_core::CAMERA_PERSPECTIVE;

use crate::perspective_transformer::EgocentricCoordinateTable;

pub const EXTRACT_OBJECTS_TEMPLATE: &str = "\
Given a spatial-reasoning question about an image, list all entities mentioned.

Example:
[Question] You are standing at the airplane's position, facing where it is facing. Is the person on your left or right?
[Detect] [airplane, person]

Now, for the question below, list the entities:
[Question] {question}
[Detect]
";

pub const PERSPECTIVE_CHANGE_TEMPLATE: &str = "\
Given a question about spatial reasoning, we want to extract the perspective of the
question. If the question is from the camera's perspective, return ++camera++.
# Example
[Question] From the woman's perspective, is the tree on the left or right?
[Perspective] ++woman++
# Your Task
Given the question below, please specify the perspective from which the question is asked.
You must return in the format:
[Perspective] ++object name++
[Question] {question}
[Options] {options}
[Perspective]
";

pub const EGOCENTRIC_REPHRASING_TEMPLATE: &str = "\
From a sentence with a perspective description, we need to remove the perspective description.
# Example
[Question] From the car's perspective, which is on the right side: the person or the tree?
[Output] Which is on the right side: the person or the tree?
# Your Task
Given the question below, please remove the perspective description.
[Question] {question}
[Output]
";

pub const NUMERICAL_PERSPECTIVE_TEMPLATE: &str = "\
You are standing at the position of the {source}, facing where it is facing.
The other objects in the scene, as [x, y, z] coordinates in your own frame:
{coordinates}
Answer the question from your own point of view.
[Question] {question}
Answer with yes or no.
";

pub fn extract_objects_prompt(question: &str) -> String {
    EXTRACT_OBJECTS_TEMPLATE.replace("{question}", question)
}

/// Options are the scene labels followed by the camera.
pub fn perspective_prompt(question: &str, options: &[String]) -> String {
    let mut options: Vec<&str> = options.iter().map(String::as_str).collect();
    options.push(CAMERA_PERSPECTIVE);
    PERSPECTIVE_CHANGE_TEMPLATE
        .replace("{options}", &options.join(", "))
        .replace("{question}", question)
}

pub fn rephrase_prompt(question: &str) -> String {
    EGOCENTRIC_REPHRASING_TEMPLATE.replace("{question}", question)
}

pub fn numerical_perspective_prompt(
    source: &str,
    coordinates: &EgocentricCoordinateTable,
    question: &str,
) -> String {
    NUMERICAL_PERSPECTIVE_TEMPLATE
        .replace("{source}", source)
        .replace("{coordinates}", &coordinates.to_string())
        .replace("{question}", question)
}
