use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    dao::models::{ParticipantEntity, QuestionEntity, ResultEntity},
    state::stage::{Cohort, CohortTarget, Role, Stage, StageTarget},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoParticipantDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: Role,
    cohort: Cohort,
    stage: Stage,
    current_score: i64,
    #[serde(default)]
    tab_switches: i64,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<ParticipantEntity> for MongoParticipantDocument {
    fn from(value: ParticipantEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
            password_hash: value.password_hash,
            role: value.role,
            cohort: value.cohort,
            stage: value.stage,
            current_score: value.current_score,
            tab_switches: value.tab_switches,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoParticipantDocument> for ParticipantEntity {
    fn from(value: MongoParticipantDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
            password_hash: value.password_hash,
            role: value.role,
            cohort: value.cohort,
            stage: value.stage,
            current_score: value.current_score,
            tab_switches: value.tab_switches,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoQuestionDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    text: String,
    options: Vec<String>,
    correct_answer: String,
    time_limit_secs: u64,
    image: Option<String>,
    target_cohort: CohortTarget,
    target_stage: StageTarget,
    created_at: DateTime,
}

impl From<QuestionEntity> for MongoQuestionDocument {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id,
            text: value.text,
            options: value.options,
            correct_answer: value.correct_answer,
            time_limit_secs: value.time_limit_secs,
            image: value.image,
            target_cohort: value.target_cohort,
            target_stage: value.target_stage,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoQuestionDocument> for QuestionEntity {
    fn from(value: MongoQuestionDocument) -> Self {
        Self {
            id: value.id,
            text: value.text,
            options: value.options,
            correct_answer: value.correct_answer,
            time_limit_secs: value.time_limit_secs,
            image: value.image,
            target_cohort: value.target_cohort,
            target_stage: value.target_stage,
            created_at: value.created_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoResultDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    participant_id: Uuid,
    name: String,
    email: String,
    score: i64,
    total_questions: i64,
    submitted_at: DateTime,
}

impl From<ResultEntity> for MongoResultDocument {
    fn from(value: ResultEntity) -> Self {
        Self {
            id: value.id,
            participant_id: value.participant_id,
            name: value.name,
            email: value.email,
            score: value.score,
            total_questions: value.total_questions,
            submitted_at: DateTime::from_system_time(value.submitted_at),
        }
    }
}

pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}
