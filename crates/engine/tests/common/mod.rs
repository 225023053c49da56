//! Shared fixtures: an in-memory database plus recording fakes for the three
//! collaborators.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue, Database, DatabaseConnection};
use uuid::Uuid;

use async_trait::async_trait;
use engine::{
    Email, Engine, EngineError, Invoice, InvoiceStatus, MailingList, Notifier, PaymentGateway,
    RevenueRecipients, SubscriberAttributes, catalog, memberships, membership_links, transactions,
    users,
};
use migration::MigratorTrait;

#[derive(Default)]
pub struct MockGateway {
    invoices: Mutex<HashMap<String, InvoiceStatus>>,
    failing: Mutex<HashSet<String>>,
    pub calls: Mutex<Vec<String>>,
}

impl MockGateway {
    pub fn set(&self, reference: &str, status: InvoiceStatus) {
        self.invoices
            .lock()
            .unwrap()
            .insert(reference.to_string(), status);
    }

    pub fn fail(&self, reference: &str) {
        self.failing.lock().unwrap().insert(reference.to_string());
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn get_invoice(&self, reference: &str) -> Result<Invoice, EngineError> {
        self.calls.lock().unwrap().push(reference.to_string());
        if self.failing.lock().unwrap().contains(reference) {
            return Err(EngineError::Gateway("connection reset by peer".to_string()));
        }
        let status = self
            .invoices
            .lock()
            .unwrap()
            .get(reference)
            .cloned()
            .ok_or_else(|| EngineError::Gateway(format!("unknown invoice {reference}")))?;
        Ok(Invoice {
            id: reference.to_string(),
            status,
            amount: None,
            paid_at: Some(Utc::now()),
        })
    }
}

pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub tags: Vec<String>,
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SentEmail>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingMailer {
    async fn send(&self, to: &str, email: &Email, tags: &[&str]) -> Result<(), EngineError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EngineError::Integration("smtp relay down".to_string()));
        }
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: email.subject.clone(),
            tags: tags.iter().map(ToString::to_string).collect(),
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingList {
    pub added: Mutex<Vec<(String, String)>>,
    failing: AtomicBool,
}

impl RecordingList {
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl MailingList for RecordingList {
    async fn add_subscriber(
        &self,
        email: &str,
        list_id: &str,
        _attributes: &SubscriberAttributes,
    ) -> Result<(), EngineError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EngineError::Integration("list provider down".to_string()));
        }
        self.added
            .lock()
            .unwrap()
            .push((email.to_string(), list_id.to_string()));
        Ok(())
    }
}

pub struct Harness {
    pub engine: Engine,
    pub db: DatabaseConnection,
    pub gateway: Arc<MockGateway>,
    pub mailer: Arc<RecordingMailer>,
    pub list: Arc<RecordingList>,
}

pub async fn harness() -> Harness {
    harness_with(RevenueRecipients::default()).await
}

pub async fn harness_with(recipients: RevenueRecipients) -> Harness {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    let gateway = Arc::new(MockGateway::default());
    let mailer = Arc::new(RecordingMailer::default());
    let list = Arc::new(RecordingList::default());

    let engine = Engine::builder()
        .database(db.clone())
        .gateway(gateway.clone())
        .mailing(list.clone())
        .notifier(mailer.clone())
        .recipients(recipients)
        .build()
        .unwrap();

    Harness {
        engine,
        db,
        gateway,
        mailer,
        list,
    }
}

pub async fn insert_user(db: &DatabaseConnection, id: &str, email: &str) {
    users::ActiveModel {
        id: ActiveValue::Set(id.to_string()),
        name: ActiveValue::Set(format!("User {id}")),
        email: ActiveValue::Set(email.to_string()),
        phone: ActiveValue::Set(None),
        mailing_list_ids: ActiveValue::Set(None),
        created_at: ActiveValue::Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap();
}

pub async fn insert_membership(
    db: &DatabaseConnection,
    id: &str,
    duration: &str,
    price: i64,
    commission_percent: i32,
    mailing_list_id: Option<&str>,
) {
    memberships::ActiveModel {
        id: ActiveValue::Set(id.to_string()),
        name: ActiveValue::Set(format!("Membership {id}")),
        duration: ActiveValue::Set(duration.to_string()),
        price: ActiveValue::Set(price),
        affiliate_commission_percent: ActiveValue::Set(commission_percent),
        mailing_list_id: ActiveValue::Set(mailing_list_id.map(ToString::to_string)),
        auto_add_to_list: ActiveValue::Set(mailing_list_id.is_some()),
    }
    .insert(db)
    .await
    .unwrap();
}

pub async fn insert_course(db: &DatabaseConnection, id: &str, mailing_list_id: Option<&str>) {
    catalog::courses::ActiveModel {
        id: ActiveValue::Set(id.to_string()),
        title: ActiveValue::Set(format!("Course {id}")),
        mailing_list_id: ActiveValue::Set(mailing_list_id.map(ToString::to_string)),
        auto_add_to_list: ActiveValue::Set(mailing_list_id.is_some()),
    }
    .insert(db)
    .await
    .unwrap();
}

pub async fn insert_product(db: &DatabaseConnection, id: &str, mailing_list_id: Option<&str>) {
    catalog::products::ActiveModel {
        id: ActiveValue::Set(id.to_string()),
        name: ActiveValue::Set(format!("Product {id}")),
        mailing_list_id: ActiveValue::Set(mailing_list_id.map(ToString::to_string)),
        auto_add_to_list: ActiveValue::Set(mailing_list_id.is_some()),
    }
    .insert(db)
    .await
    .unwrap();
}

pub async fn insert_group(db: &DatabaseConnection, id: &str) {
    catalog::groups::ActiveModel {
        id: ActiveValue::Set(id.to_string()),
        name: ActiveValue::Set(format!("Group {id}")),
    }
    .insert(db)
    .await
    .unwrap();
}

pub async fn link_group(db: &DatabaseConnection, membership_id: &str, group_id: &str) {
    membership_links::membership_groups::ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4().to_string()),
        membership_id: ActiveValue::Set(membership_id.to_string()),
        group_id: ActiveValue::Set(group_id.to_string()),
    }
    .insert(db)
    .await
    .unwrap();
}

pub async fn link_course(db: &DatabaseConnection, membership_id: &str, course_id: &str) {
    membership_links::membership_courses::ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4().to_string()),
        membership_id: ActiveValue::Set(membership_id.to_string()),
        course_id: ActiveValue::Set(course_id.to_string()),
    }
    .insert(db)
    .await
    .unwrap();
}

pub async fn link_product(db: &DatabaseConnection, membership_id: &str, product_id: &str) {
    membership_links::membership_products::ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4().to_string()),
        membership_id: ActiveValue::Set(membership_id.to_string()),
        product_id: ActiveValue::Set(product_id.to_string()),
    }
    .insert(db)
    .await
    .unwrap();
}

/// Transaction fixture; defaults make an eligible reconciliation candidate
/// (PENDING, ten minutes old, with gateway references).
pub struct Tx {
    pub id: String,
    pub user_id: String,
    pub status: String,
    pub kind: String,
    pub amount: i64,
    pub age_minutes: i64,
    pub external_id: Option<String>,
    pub reference: Option<String>,
    pub membership_id: Option<String>,
    pub course_id: Option<String>,
    pub product_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl Tx {
    pub fn pending(id: &str, user_id: &str, kind: &str) -> Self {
        Self {
            id: id.to_string(),
            user_id: user_id.to_string(),
            status: "PENDING".to_string(),
            kind: kind.to_string(),
            amount: 1_000_000,
            age_minutes: 10,
            external_id: Some(format!("ext_{id}")),
            reference: Some(format!("inv_{id}")),
            membership_id: None,
            course_id: None,
            product_id: None,
            metadata: None,
        }
    }

    pub fn success(id: &str, user_id: &str, kind: &str) -> Self {
        let mut tx = Self::pending(id, user_id, kind);
        tx.status = "SUCCESS".to_string();
        tx
    }

    pub async fn insert(self, db: &DatabaseConnection) {
        transactions::ActiveModel {
            id: ActiveValue::Set(self.id),
            user_id: ActiveValue::Set(self.user_id),
            status: ActiveValue::Set(self.status),
            kind: ActiveValue::Set(self.kind),
            amount: ActiveValue::Set(self.amount),
            external_id: ActiveValue::Set(self.external_id),
            reference: ActiveValue::Set(self.reference),
            membership_id: ActiveValue::Set(self.membership_id),
            course_id: ActiveValue::Set(self.course_id),
            product_id: ActiveValue::Set(self.product_id),
            customer_name: ActiveValue::Set(None),
            customer_email: ActiveValue::Set(None),
            customer_phone: ActiveValue::Set(None),
            payment_method: ActiveValue::Set(None),
            metadata: ActiveValue::Set(self.metadata),
            notes: ActiveValue::Set(None),
            created_at: ActiveValue::Set(Utc::now() - Duration::minutes(self.age_minutes)),
            paid_at: ActiveValue::Set(None),
            expired_at: ActiveValue::Set(None),
        }
        .insert(db)
        .await
        .unwrap();
    }
}
