use std::sync::Arc;

use egoview_core::{
    scene::{LabelMatching, ScenePoseTable},
    EgoviewError, LogSink, Result,
};
use egoview_vision::SceneAbstraction;
use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::{
    language_model::{LanguageModel, Message},
    parsing::{parse_object_list, parse_perspective},
    perspective_transformer::{
        EgocentricCoordinateTable, PerspectiveTransformer, PerspectiveType, DEFAULT_DECIMALS,
    },
    prompts,
};

/// The four capabilities of a perspective-aware question answerer.
pub trait PerspectiveQuestionAnswering {
    /// Full pipeline; returns the model's final answer verbatim.
    fn ask_question_with_perspective(&mut self, question: &str, image: &RgbImage)
        -> Result<String>;
    fn extract_objects_from_question(&mut self, question: &str) -> Result<Vec<String>>;
    fn rephrase_to_egocentric(&mut self, question: &str) -> Result<String>;
    fn generate_perspective_prompt(
        &self,
        egocentric_question: &str,
        scene: &ScenePoseTable,
        central_perspective: &str,
    ) -> Result<String>;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionRouterCfg {
    pub perspective_type: PerspectiveType,
    pub label_matching: LabelMatching,
    pub decimals: u32,
    pub attach_image_to_answer: bool,
}

impl Default for QuestionRouterCfg {
    fn default() -> Self {
        Self {
            perspective_type: PerspectiveType::Numerical,
            label_matching: LabelMatching::Exact,
            decimals: DEFAULT_DECIMALS,
            attach_image_to_answer: false,
        }
    }
}

impl QuestionRouterCfg {
    pub fn finalize<L, A>(
        self,
        language_model: L,
        scene_abstraction: A,
        log: LogSink,
    ) -> Result<QuestionRouter<L, A>> {
        if self.decimals > 12 {
            return Err(EgoviewError::Config(format!(
                "at most 12 decimals are meaningful, got {}",
                self.decimals
            )));
        }

        let transformer = PerspectiveTransformer::new(log.child("perspective"))
            .with_decimals(self.decimals)
            .with_label_matching(self.label_matching);

        Ok(QuestionRouter {
            cfg: self,
            language_model,
            scene_abstraction,
            transformer,
            log,
        })
    }
}

/// Everything produced while answering one question.
#[derive(Clone, Debug)]
pub struct PerspectiveAnswer {
    pub objects: Vec<String>,
    pub scene: ScenePoseTable,
    pub central_perspective: String,
    pub egocentric_question: String,
    pub coordinates: EgocentricCoordinateTable,
    pub prompt: String,
    pub answer: String,
}

pub struct QuestionRouter<L, A> {
    cfg: QuestionRouterCfg,
    language_model: L,
    scene_abstraction: A,
    transformer: PerspectiveTransformer,
    log: LogSink,
}

impl<L, A> QuestionRouter<L, A> {
    pub fn cfg(&self) -> &QuestionRouterCfg {
        &self.cfg
    }

    pub fn language_model(&self) -> &L {
        &self.language_model
    }

    fn ensure_supported(&self) -> Result<()> {
        match self.cfg.perspective_type {
            PerspectiveType::Numerical => Ok(()),
            PerspectiveType::Visual => Err(EgoviewError::Unsupported(
                "visual perspective prompts are not implemented".to_string(),
            )),
        }
    }

    pub fn egocentric_coordinates(
        &self,
        scene: &ScenePoseTable,
        central_perspective: &str,
    ) -> Result<EgocentricCoordinateTable> {
        self.transformer
            .transform_to_egocentric(scene, central_perspective)
    }
}

impl<L: LanguageModel, A> QuestionRouter<L, A> {
    fn generate(&mut self, message: Message) -> Result<String> {
        Ok(self.language_model.generate(&message)?)
    }

    /// Which scene object (or the camera) the question is asked from.
    pub fn find_perspective(&mut self, question: &str, options: &[String]) -> Result<String> {
        let output = self.generate(Message::user_text(prompts::perspective_prompt(
            question, options,
        )))?;
        parse_perspective(&output)
    }
}

impl<L: LanguageModel, A: SceneAbstraction> QuestionRouter<L, A> {
    pub fn answer_with_trace(
        &mut self,
        question: &str,
        image: &RgbImage,
    ) -> Result<PerspectiveAnswer> {
        self.ensure_supported()?;

        let objects = self.extract_objects_from_question(question)?;
        self.log
            .info(format_args!("objects extracted from question: {objects:?}"));

        let scene = self.scene_abstraction.abstract_scene(image, &objects)?;
        self.log
            .info(format_args!("scene labels: {:?}", scene.labels()));

        let central_perspective = self.find_perspective(question, &scene.labels())?;
        self.log
            .info(format_args!("central perspective: {central_perspective:?}"));

        let egocentric_question = self.rephrase_to_egocentric(question)?;
        self.log
            .info(format_args!("egocentric question: {egocentric_question:?}"));

        let coordinates = self.egocentric_coordinates(&scene, &central_perspective)?;
        let prompt =
            prompts::numerical_perspective_prompt(&central_perspective, &coordinates, &egocentric_question);
        self.log.debug(format_args!("perspective prompt:\n{prompt}"));

        let mut message = Message::user_text(prompt.clone());
        if self.cfg.attach_image_to_answer {
            message = message.with_image(Arc::new(image.clone()));
        }
        let answer = self.generate(message)?;
        self.log.info(format_args!("answer: {answer:?}"));

        Ok(PerspectiveAnswer {
            objects,
            scene,
            central_perspective,
            egocentric_question,
            coordinates,
            prompt,
            answer,
        })
    }
}

impl<L: LanguageModel, A: SceneAbstraction> PerspectiveQuestionAnswering for QuestionRouter<L, A> {
    fn ask_question_with_perspective(
        &mut self,
        question: &str,
        image: &RgbImage,
    ) -> Result<String> {
        Ok(self.answer_with_trace(question, image)?.answer)
    }

    fn extract_objects_from_question(&mut self, question: &str) -> Result<Vec<String>> {
        let output =
            self.generate(Message::user_text(prompts::extract_objects_prompt(question)))?;
        parse_object_list(&output).inspect_err(|_| {
            self.log
                .error(format_args!("failed to extract objects from {output:?}"))
        })
    }

    fn rephrase_to_egocentric(&mut self, question: &str) -> Result<String> {
        let output = self.generate(Message::user_text(prompts::rephrase_prompt(question)))?;
        Ok(output.trim().to_string())
    }

    fn generate_perspective_prompt(
        &self,
        egocentric_question: &str,
        scene: &ScenePoseTable,
        central_perspective: &str,
    ) -> Result<String> {
        self.ensure_supported()?;
        let coordinates = self.egocentric_coordinates(scene, central_perspective)?;
        Ok(prompts::numerical_perspective_prompt(
            central_perspective,
            &coordinates,
            egocentric_question,
        ))
    }
}
