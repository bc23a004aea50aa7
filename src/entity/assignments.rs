//! 任务 / 考试实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "assignments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub subject: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub kind: String,
    pub week_number: i32,
    pub year: i32,
    pub status: String,
    pub created_by: i64,
    pub due_date: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CreatedBy",
        to = "super::users::Column::Id"
    )]
    Creator,
    #[sea_orm(has_many = "super::class_assignments::Entity")]
    ClassAssignments,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::class_assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClassAssignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型，目标班级由调用方补充
impl Model {
    pub fn into_assignment(
        self,
        class_ids: Vec<String>,
    ) -> crate::models::assignments::entities::Assignment {
        use crate::models::assignments::entities::{
            Assignment, AssignmentKind, AssignmentStatus,
        };
        use chrono::{DateTime, Utc};

        Assignment {
            id: self.id,
            title: self.title,
            subject: self.subject,
            description: self.description,
            kind: self
                .kind
                .parse::<AssignmentKind>()
                .unwrap_or(AssignmentKind::Task),
            week_number: self.week_number,
            year: self.year,
            status: self
                .status
                .parse::<AssignmentStatus>()
                .unwrap_or(AssignmentStatus::Draft),
            created_by: self.created_by,
            class_ids,
            due_date: self
                .due_date
                .map(|ts| DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()),
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
