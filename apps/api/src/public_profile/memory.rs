//! In-memory `PublicProfileRepository` for tests. Mirrors the Postgres
//! implementation's ordering and uniqueness rules.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::public_profile::PublicProfileRow;
use crate::public_profile::models::{
    PublicDocument, PublicExperience, PublicOwner, PublicPortfolioItem, PublicProfileDetails,
    PublicProfileInput, PublicSkill,
};
use crate::public_profile::repository::PublicProfileRepository;
use crate::public_profile::service::SLUG_TAKEN;

/// Category loads that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Skills,
    Experiences,
    Documents,
    Portfolio,
}

struct SeededSkill {
    user_id: Uuid,
    category_order: i32,
    skill: PublicSkill,
}

struct SeededItem {
    user_id: Uuid,
    order: i32,
    created_at: DateTime<Utc>,
    item: PublicPortfolioItem,
}

#[derive(Default)]
struct Store {
    users: HashMap<Uuid, PublicOwner>,
    configs: Vec<PublicProfileRow>,
    skills: Vec<SeededSkill>,
    experiences: Vec<(Uuid, PublicExperience)>,
    documents: Vec<(Uuid, PublicDocument)>,
    portfolio: Vec<SeededItem>,
    project_skills: Vec<(Uuid, Uuid)>,
    failing: HashSet<Category>,
}

#[derive(Default)]
pub struct MemoryRepository {
    store: Mutex<Store>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_user(&self, full_name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.store.lock().unwrap().users.insert(
            id,
            PublicOwner {
                id,
                full_name: full_name.to_string(),
                profile: None,
            },
        );
        id
    }

    pub fn seed_profile(&self, user_id: Uuid, profile: PublicProfileDetails) {
        if let Some(owner) = self.store.lock().unwrap().users.get_mut(&user_id) {
            owner.profile = Some(profile);
        }
    }

    pub fn remove_user(&self, user_id: Uuid) {
        self.store.lock().unwrap().users.remove(&user_id);
    }

    pub fn seed_skill(
        &self,
        user_id: Uuid,
        name: &str,
        level: i16,
        category: (&str, i32),
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.store.lock().unwrap().skills.push(SeededSkill {
            user_id,
            category_order: category.1,
            skill: PublicSkill {
                id,
                name: name.to_string(),
                level,
                category_name: category.0.to_string(),
                project_count: 0,
            },
        });
        id
    }

    pub fn seed_experience(&self, user_id: Uuid, company: &str, start: NaiveDate) -> Uuid {
        let id = Uuid::new_v4();
        self.store.lock().unwrap().experiences.push((
            user_id,
            PublicExperience {
                id,
                company: company.to_string(),
                role: "Engineer".to_string(),
                start_date: start,
                end_date: None,
                location: None,
                bullets: vec![format!("Shipped things at {company}")],
            },
        ));
        id
    }

    pub fn seed_cv(&self, user_id: Uuid, name: &str, created_at: DateTime<Utc>) -> Uuid {
        let id = Uuid::new_v4();
        self.store.lock().unwrap().documents.push((
            user_id,
            PublicDocument {
                id,
                name: name.to_string(),
                file_url: format!("documents/{user_id}/{id}.pdf"),
                file_type: "pdf".to_string(),
                created_at,
            },
        ));
        id
    }

    pub fn seed_project(&self, user_id: Uuid, title: &str, order: i32) -> Uuid {
        let id = Uuid::new_v4();
        self.store.lock().unwrap().portfolio.push(SeededItem {
            user_id,
            order,
            created_at: Utc::now(),
            item: PublicPortfolioItem {
                id,
                title: title.to_string(),
                description: None,
                url: None,
                tags: Vec::new(),
                image_url: None,
            },
        });
        id
    }

    /// Records a `project_skills` row.
    pub fn link_skill(&self, skill_id: Uuid, project_id: Uuid) {
        let mut store = self.store.lock().unwrap();
        if !store.project_skills.contains(&(skill_id, project_id)) {
            store.project_skills.push((skill_id, project_id));
        }
    }

    pub fn fail(&self, category: Category) {
        self.store.lock().unwrap().failing.insert(category);
    }

    pub fn config_count(&self) -> usize {
        self.store.lock().unwrap().configs.len()
    }

    fn check(&self, category: Category) -> Result<(), AppError> {
        if self.store.lock().unwrap().failing.contains(&category) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "{category:?} unavailable"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl PublicProfileRepository for MemoryRepository {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<PublicProfileRow>, AppError> {
        let store = self.store.lock().unwrap();
        Ok(store.configs.iter().find(|c| c.user_id == user_id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PublicProfileRow>, AppError> {
        let store = self.store.lock().unwrap();
        Ok(store
            .configs
            .iter()
            .find(|c| c.slug.as_deref() == Some(slug))
            .cloned())
    }

    async fn upsert(
        &self,
        user_id: Uuid,
        slug: Option<&str>,
        input: &PublicProfileInput,
    ) -> Result<PublicProfileRow, AppError> {
        let mut store = self.store.lock().unwrap();
        if let Some(slug) = slug {
            let clash = store
                .configs
                .iter()
                .any(|c| c.user_id != user_id && c.slug.as_deref() == Some(slug));
            if clash {
                return Err(AppError::DomainRule(SLUG_TAKEN.to_string()));
            }
        }

        let now = Utc::now();
        let existing = store.configs.iter().position(|c| c.user_id == user_id);
        let (id, created_at) = match existing {
            Some(i) => (store.configs[i].id, store.configs[i].created_at),
            None => (Uuid::new_v4(), now),
        };
        let row = PublicProfileRow {
            id,
            user_id,
            slug: slug.map(str::to_string),
            enabled: input.enabled,
            seo_indexable: input.seo_indexable,
            show_profile: input.show_profile,
            show_skills: input.show_skills,
            show_experience: input.show_experience,
            show_projects: input.show_projects,
            show_contact: input.show_contact,
            allow_cv_request: input.allow_cv_request,
            selected_project_ids: input.selected_project_ids.clone(),
            selected_experience_ids: input.selected_experience_ids.clone(),
            selected_cv_id: input.selected_cv_id,
            created_at,
            updated_at: now,
        };
        match existing {
            Some(i) => store.configs[i] = row.clone(),
            None => store.configs.push(row.clone()),
        }
        Ok(row)
    }

    async fn find_owner(&self, user_id: Uuid) -> Result<Option<PublicOwner>, AppError> {
        Ok(self.store.lock().unwrap().users.get(&user_id).cloned())
    }

    async fn proven_skills(&self, user_id: Uuid) -> Result<Vec<PublicSkill>, AppError> {
        self.check(Category::Skills)?;
        let store = self.store.lock().unwrap();
        // Inner join: a skill appears once per linked project that still exists.
        let mut rows: Vec<(i32, PublicSkill)> = store
            .skills
            .iter()
            .filter(|s| s.user_id == user_id)
            .filter_map(|s| {
                let project_count = store
                    .project_skills
                    .iter()
                    .filter(|(skill_id, project_id)| {
                        *skill_id == s.skill.id
                            && store.portfolio.iter().any(|p| p.item.id == *project_id)
                    })
                    .count() as i64;
                (project_count > 0).then(|| {
                    (
                        s.category_order,
                        PublicSkill {
                            project_count,
                            ..s.skill.clone()
                        },
                    )
                })
            })
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name.cmp(&b.1.name)));
        Ok(rows.into_iter().map(|(_, skill)| skill).collect())
    }

    async fn experiences(&self, user_id: Uuid) -> Result<Vec<PublicExperience>, AppError> {
        self.check(Category::Experiences)?;
        let store = self.store.lock().unwrap();
        let mut rows: Vec<PublicExperience> = store
            .experiences
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, e)| e.clone())
            .collect();
        rows.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(rows)
    }

    async fn cv_documents(&self, user_id: Uuid) -> Result<Vec<PublicDocument>, AppError> {
        self.check(Category::Documents)?;
        let store = self.store.lock().unwrap();
        let mut rows: Vec<PublicDocument> = store
            .documents
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, d)| d.clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn portfolio_items(
        &self,
        user_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<PublicPortfolioItem>, AppError> {
        self.check(Category::Portfolio)?;
        let store = self.store.lock().unwrap();
        let mut rows: Vec<&SeededItem> = store
            .portfolio
            .iter()
            .filter(|p| p.user_id == user_id && ids.contains(&p.item.id))
            .collect();
        rows.sort_by(|a, b| {
            a.order
                .cmp(&b.order)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(rows.into_iter().map(|p| p.item.clone()).collect())
    }
}
