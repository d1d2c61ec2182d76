//! Client record engine: the deterministic state-transition functions.
//!
//! Every operation follows the same shape: read current state through the
//! store adapter, validate, mutate the in-memory record, append exactly one
//! audit entry, serialize canonically, write back. A validation failure
//! aborts before any write; the store never observes a record mid-mutation.
//!
//! There is no shared mutable state across invocations. An engine value
//! holds only configuration; all record state is read fresh from the store
//! inside each call.

use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use kyc_ledger_types::{
    Account, AuditAction, AuditEntry, ClientRecord, CreatedBy, EngineConfig, ImageRef,
    Nationality, NewClientRecord, RecordId, RecordKind, codec, validation,
};

use crate::context::TransactionContext;
use crate::error::{CodecSnafu, EngineError, Result, StorageSnafu};
use crate::ident::{next_record_id, prefix_end};
use crate::similarity::{FaceComparator, SimilarityMatch, SimilarityScorer};
use crate::store::WorldState;

/// Probe used to read only the kind discriminator of a stored document.
///
/// Decodes successfully only for documents of the client kind; other
/// document types sharing the keyspace fail the probe and are skipped by
/// scans.
#[derive(Deserialize)]
struct KindProbe {
    #[serde(rename = "recordKind")]
    #[allow(dead_code)]
    record_kind: RecordKind,
}

/// Result of a create invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum CreateOutcome {
    /// No existing record met the duplicate threshold; the record was
    /// written.
    Created {
        /// The stored record, identifier assigned.
        record: ClientRecord,
    },
    /// At least one existing record met the threshold; nothing was written.
    PotentialDuplicate {
        /// The rejected candidate, unchanged.
        candidate: NewClientRecord,
        /// Every existing record at or above the threshold, best first.
        matches: Vec<SimilarityMatch>,
    },
}

/// A partial update of the mutable identity attributes.
///
/// Fields are enumerated rather than dispatched from arbitrary keys; the
/// allow-list is the set of fields below. Use
/// [`from_json_fields`](Self::from_json_fields) at the JSON boundary to get
/// allow-list and null checking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttributeUpdate {
    /// New given name.
    pub first_name: Option<String>,
    /// New family name.
    pub last_name: Option<String>,
    /// New date of birth.
    pub date_of_birth: Option<chrono::NaiveDate>,
    /// New gender.
    pub gender: Option<String>,
    /// New email address.
    pub email: Option<String>,
    /// New biometric image reference.
    pub face_image_ref: Option<ImageRef>,
    /// New activation state.
    pub is_active: Option<bool>,
}

impl AttributeUpdate {
    const ALLOWED_FIELDS: [&'static str; 7] = [
        "firstName",
        "lastName",
        "dateOfBirth",
        "gender",
        "email",
        "faceImageRef",
        "isActive",
    ];

    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.date_of_birth.is_none()
            && self.gender.is_none()
            && self.email.is_none()
            && self.face_image_ref.is_none()
            && self.is_active.is_none()
    }

    /// Builds an update from JSON-shaped fields, enforcing the allow-list.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::ForbiddenField` for any key outside the
    /// allow-list, and `EngineError::InvalidArgument` for a `null` value or
    /// a value of the wrong type.
    pub fn from_json_fields(fields: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        for (key, value) in fields {
            if !Self::ALLOWED_FIELDS.contains(&key.as_str()) {
                return Err(EngineError::ForbiddenField { field: key.clone() });
            }
            if value.is_null() {
                return Err(EngineError::InvalidArgument {
                    field: key.clone(),
                    constraint: "must not be null".to_string(),
                });
            }
        }
        serde_json::from_value(serde_json::Value::Object(fields.clone())).map_err(|e| {
            EngineError::InvalidArgument {
                field: "attributes".to_string(),
                constraint: e.to_string(),
            }
        })
    }

    /// Applies the set fields to a record, returning the wire names of the
    /// fields that were set, in allow-list order.
    fn apply(self, record: &mut ClientRecord) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if let Some(value) = self.first_name {
            record.first_name = value;
            changed.push("firstName");
        }
        if let Some(value) = self.last_name {
            record.last_name = value;
            changed.push("lastName");
        }
        if let Some(value) = self.date_of_birth {
            record.date_of_birth = value;
            changed.push("dateOfBirth");
        }
        if let Some(value) = self.gender {
            record.gender = value;
            changed.push("gender");
        }
        if let Some(value) = self.email {
            record.email = value;
            changed.push("email");
        }
        if let Some(value) = self.face_image_ref {
            record.face_image_ref = Some(value);
            changed.push("faceImageRef");
        }
        if let Some(value) = self.is_active {
            record.is_active = value;
            changed.push("isActive");
        }
        changed
    }
}

/// The state-transition engine over client records.
///
/// Holds configuration only; every operation reads record state fresh from
/// the supplied store.
#[derive(Debug, Clone)]
pub struct ClientRecordEngine {
    config: EngineConfig,
}

impl Default for ClientRecordEngine {
    fn default() -> Self {
        Self { config: EngineConfig::default() }
    }
}

impl ClientRecordEngine {
    /// Creates an engine with validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` if the configuration fails
    /// validation.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate().map_err(|e| EngineError::InvalidArgument {
            field: "config".to_string(),
            constraint: e.to_string(),
        })?;
        Ok(Self { config })
    }

    /// The engine's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Creates a new client record after duplicate screening.
    ///
    /// Screening runs against every existing client record, active or
    /// inactive. If any scores at or above the threshold the candidate is
    /// returned as [`CreateOutcome::PotentialDuplicate`] and nothing is
    /// written. Otherwise an identifier is derived for the context's
    /// period, its absence re-checked, and the record stored with
    /// `is_active = true` and one `CREATE` audit entry.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for empty or oversized fields, duplicate account
    ///   numbers or countries within the request, or no nationality
    /// - `OracleUnavailable` if a face comparison cannot be answered
    /// - `DuplicateKey` if the derived identifier already exists
    /// - `Storage` / `Codec` on adapter or serialization failure
    pub fn create<S: WorldState>(
        &self,
        store: &mut S,
        ctx: &TransactionContext,
        comparator: &dyn FaceComparator,
        request: NewClientRecord,
    ) -> Result<CreateOutcome> {
        self.validate_new_record(&request)?;

        let existing = self.scan_client_records(store)?;
        let scorer = SimilarityScorer::new(&self.config.scoring, comparator);
        let matches = scorer.screen(&request, existing.iter())?;
        if !matches.is_empty() {
            tracing::info!(
                caller = ctx.caller_organization_id(),
                matches = matches.len(),
                top_score = matches[0].score,
                "create rejected: potential duplicate"
            );
            return Ok(CreateOutcome::PotentialDuplicate { candidate: request, matches });
        }

        let id = next_record_id(store, &ctx.period(), &self.config.identifier)?;
        if store.get(id.as_str()).context(StorageSnafu)?.is_some() {
            return Err(EngineError::DuplicateKey { id: id.as_str().to_string() });
        }

        let record = ClientRecord {
            id: id.clone(),
            record_kind: RecordKind::Client,
            first_name: request.first_name,
            last_name: request.last_name,
            date_of_birth: request.date_of_birth,
            gender: request.gender,
            email: request.email,
            account_list: request.account_list,
            nationalities: request.nationalities,
            face_image_ref: request.face_image_ref,
            is_active: true,
            created_by: CreatedBy {
                organization_id: ctx.caller_organization_id().to_string(),
                timestamp: ctx.transaction_timestamp(),
            },
            audit_log: vec![AuditEntry::new(
                ctx.caller_organization_id(),
                ctx.transaction_timestamp(),
                AuditAction::Create,
            )],
        };

        self.store_record(store, &record)?;
        tracing::info!(id = %id, caller = ctx.caller_organization_id(), "client record created");
        Ok(CreateOutcome::Created { record })
    }

    fn validate_new_record(&self, request: &NewClientRecord) -> Result<()> {
        let cfg = &self.config.validation;
        validation::validate_person_name(&request.first_name, "firstName", cfg)?;
        validation::validate_person_name(&request.last_name, "lastName", cfg)?;
        validation::validate_email(&request.email, cfg)?;
        if request.gender.trim().is_empty() {
            return Err(EngineError::InvalidArgument {
                field: "gender".to_string(),
                constraint: "must not be empty".to_string(),
            });
        }
        if request.nationalities.is_empty() {
            return Err(EngineError::InvalidArgument {
                field: "nationalities".to_string(),
                constraint: "at least one nationality is required".to_string(),
            });
        }
        for nationality in &request.nationalities {
            validation::validate_nationality(nationality, cfg)?;
        }
        for (index, nationality) in request.nationalities.iter().enumerate() {
            let country = nationality.country_name.trim().to_lowercase();
            if request.nationalities[..index]
                .iter()
                .any(|n| n.country_name.trim().to_lowercase() == country)
            {
                return Err(EngineError::InvalidArgument {
                    field: "nationalities".to_string(),
                    constraint: format!("duplicate country '{}'", nationality.country_name),
                });
            }
        }
        for account in &request.account_list {
            validation::validate_account(account, cfg)?;
        }
        for (index, account) in request.account_list.iter().enumerate() {
            if request.account_list[..index]
                .iter()
                .any(|a| a.account_number == account.account_number)
            {
                return Err(EngineError::InvalidArgument {
                    field: "accountList".to_string(),
                    constraint: format!("duplicate account number '{}'", account.account_number),
                });
            }
        }
        Ok(())
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// Reads a record without mutating anything.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the identifier is absent, `Codec` if the
    /// stored bytes fail to decode, `Storage` on adapter failure.
    pub fn read<S: WorldState>(&self, store: &S, id: &RecordId) -> Result<ClientRecord> {
        self.load_record(store, id)
    }

    /// Reads a record and journals the access.
    ///
    /// Appends a `READ` audit entry and rewrites the record, so this is a
    /// write despite being semantically a read. Callers that must not
    /// produce a write use [`read`](Self::read) instead.
    ///
    /// # Errors
    ///
    /// Same as [`read`](Self::read), plus `Storage`/`Codec` on write-back.
    pub fn record_access<S: WorldState>(
        &self,
        store: &mut S,
        ctx: &TransactionContext,
        id: &RecordId,
    ) -> Result<ClientRecord> {
        let mut record = self.load_record(store, id)?;
        record.append_audit(AuditEntry::new(
            ctx.caller_organization_id(),
            ctx.transaction_timestamp(),
            AuditAction::Read,
        ));
        self.store_record(store, &record)?;
        tracing::debug!(id = %id, caller = ctx.caller_organization_id(), "record access journaled");
        Ok(record)
    }

    // =========================================================================
    // Attribute update
    // =========================================================================

    /// Applies a partial update of the mutable identity attributes.
    ///
    /// Updated values are validated against the same limits as creation.
    /// The audit entry's detail records which field names changed.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the identifier is absent
    /// - `InvalidArgument` if no field is set or a set value fails
    ///   validation
    /// - `Storage` / `Codec` on adapter or serialization failure
    pub fn update_attributes<S: WorldState>(
        &self,
        store: &mut S,
        ctx: &TransactionContext,
        id: &RecordId,
        update: AttributeUpdate,
    ) -> Result<ClientRecord> {
        if update.is_empty() {
            return Err(EngineError::InvalidArgument {
                field: "attributes".to_string(),
                constraint: "at least one field must be set".to_string(),
            });
        }
        let cfg = &self.config.validation;
        if let Some(value) = &update.first_name {
            validation::validate_person_name(value, "firstName", cfg)?;
        }
        if let Some(value) = &update.last_name {
            validation::validate_person_name(value, "lastName", cfg)?;
        }
        if let Some(value) = &update.email {
            validation::validate_email(value, cfg)?;
        }
        if let Some(value) = &update.gender {
            if value.trim().is_empty() {
                return Err(EngineError::InvalidArgument {
                    field: "gender".to_string(),
                    constraint: "must not be empty".to_string(),
                });
            }
        }

        let mut record = self.load_record(store, id)?;
        let changed = update.apply(&mut record);
        record.append_audit(AuditEntry::with_detail(
            ctx.caller_organization_id(),
            ctx.transaction_timestamp(),
            AuditAction::UpdateAttributes,
            format!("changed: {}", changed.join(", ")),
        ));
        self.store_record(store, &record)?;
        tracing::debug!(id = %id, fields = ?changed, "attributes updated");
        Ok(record)
    }

    // =========================================================================
    // Activation lifecycle
    // =========================================================================

    /// Reactivates a deactivated record.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent, `AlreadyInState` if already active.
    pub fn activate<S: WorldState>(
        &self,
        store: &mut S,
        ctx: &TransactionContext,
        id: &RecordId,
    ) -> Result<ClientRecord> {
        self.set_active(store, ctx, id, true)
    }

    /// Deactivates a record. Soft state, reversible; the record stays
    /// stored.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent, `AlreadyInState` if already inactive.
    pub fn deactivate<S: WorldState>(
        &self,
        store: &mut S,
        ctx: &TransactionContext,
        id: &RecordId,
    ) -> Result<ClientRecord> {
        self.set_active(store, ctx, id, false)
    }

    fn set_active<S: WorldState>(
        &self,
        store: &mut S,
        ctx: &TransactionContext,
        id: &RecordId,
        target: bool,
    ) -> Result<ClientRecord> {
        let mut record = self.load_record(store, id)?;
        if record.is_active == target {
            return Err(EngineError::AlreadyInState {
                id: id.as_str().to_string(),
                active: target,
            });
        }
        record.is_active = target;
        let action = if target { AuditAction::Activate } else { AuditAction::Deactivate };
        record.append_audit(AuditEntry::new(
            ctx.caller_organization_id(),
            ctx.transaction_timestamp(),
            action,
        ));
        self.store_record(store, &record)?;
        tracing::info!(id = %id, active = target, "activation state changed");
        Ok(record)
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Adds a bank account to an active record.
    ///
    /// # Errors
    ///
    /// - `NotFound` if absent, `InactiveRecord` if deactivated
    /// - `InvalidArgument` if either account field is empty after trimming
    /// - `DuplicateAccount` if the account number is already present
    pub fn add_account<S: WorldState>(
        &self,
        store: &mut S,
        ctx: &TransactionContext,
        id: &RecordId,
        account: Account,
    ) -> Result<ClientRecord> {
        validation::validate_account(&account, &self.config.validation)?;
        let mut record = self.load_active_record(store, id)?;
        if record.has_account(&account.account_number) {
            return Err(EngineError::DuplicateAccount {
                id: id.as_str().to_string(),
                account_number: account.account_number,
            });
        }
        let detail = format!("{} at {}", account.account_number, account.bank_name);
        record.account_list.push(account);
        record.append_audit(AuditEntry::with_detail(
            ctx.caller_organization_id(),
            ctx.transaction_timestamp(),
            AuditAction::AddAccount,
            detail,
        ));
        self.store_record(store, &record)?;
        tracing::debug!(id = %id, "account added");
        Ok(record)
    }

    /// Removes a bank account by account number from an active record.
    ///
    /// # Errors
    ///
    /// - `NotFound` if absent, `InactiveRecord` if deactivated
    /// - `AccountNotFound` if no account carries the number
    pub fn remove_account<S: WorldState>(
        &self,
        store: &mut S,
        ctx: &TransactionContext,
        id: &RecordId,
        account_number: &str,
    ) -> Result<ClientRecord> {
        let mut record = self.load_active_record(store, id)?;
        let position = record
            .account_list
            .iter()
            .position(|a| a.account_number == account_number)
            .ok_or_else(|| EngineError::AccountNotFound {
                id: id.as_str().to_string(),
                account_number: account_number.to_string(),
            })?;
        let removed = record.account_list.remove(position);
        record.append_audit(AuditEntry::with_detail(
            ctx.caller_organization_id(),
            ctx.transaction_timestamp(),
            AuditAction::RemoveAccount,
            format!("{} at {}", removed.account_number, removed.bank_name),
        ));
        self.store_record(store, &record)?;
        tracing::debug!(id = %id, "account removed");
        Ok(record)
    }

    // =========================================================================
    // Nationalities
    // =========================================================================

    /// Adds a nationality to an active record.
    ///
    /// # Errors
    ///
    /// - `NotFound` if absent, `InactiveRecord` if deactivated
    /// - `InvalidArgument` on empty required fields
    /// - `DuplicateNationality` if the country is already present
    pub fn add_nationality<S: WorldState>(
        &self,
        store: &mut S,
        ctx: &TransactionContext,
        id: &RecordId,
        nationality: Nationality,
    ) -> Result<ClientRecord> {
        validation::validate_nationality(&nationality, &self.config.validation)?;
        let mut record = self.load_active_record(store, id)?;
        if record.has_nationality(&nationality.country_name) {
            return Err(EngineError::DuplicateNationality {
                id: id.as_str().to_string(),
                country_name: nationality.country_name,
            });
        }
        let detail = nationality.country_name.clone();
        record.nationalities.push(nationality);
        record.append_audit(AuditEntry::with_detail(
            ctx.caller_organization_id(),
            ctx.transaction_timestamp(),
            AuditAction::AddNationality,
            detail,
        ));
        self.store_record(store, &record)?;
        tracing::debug!(id = %id, "nationality added");
        Ok(record)
    }

    /// Removes a nationality by country name from an active record.
    ///
    /// A record must retain at least one nationality at all times.
    ///
    /// # Errors
    ///
    /// - `NotFound` if absent, `InactiveRecord` if deactivated
    /// - `NationalityNotFound` if the country is not present
    /// - `LastNationality` if removal would empty the list
    pub fn remove_nationality<S: WorldState>(
        &self,
        store: &mut S,
        ctx: &TransactionContext,
        id: &RecordId,
        country_name: &str,
    ) -> Result<ClientRecord> {
        let mut record = self.load_active_record(store, id)?;
        let wanted = country_name.trim().to_lowercase();
        let position = record
            .nationalities
            .iter()
            .position(|n| n.country_name.trim().to_lowercase() == wanted)
            .ok_or_else(|| EngineError::NationalityNotFound {
                id: id.as_str().to_string(),
                country_name: country_name.to_string(),
            })?;
        if record.nationalities.len() == 1 {
            return Err(EngineError::LastNationality { id: id.as_str().to_string() });
        }
        let removed = record.nationalities.remove(position);
        record.append_audit(AuditEntry::with_detail(
            ctx.caller_organization_id(),
            ctx.transaction_timestamp(),
            AuditAction::RemoveNationality,
            removed.country_name,
        ));
        self.store_record(store, &record)?;
        tracing::debug!(id = %id, "nationality removed");
        Ok(record)
    }

    // =========================================================================
    // Enumeration
    // =========================================================================

    /// Returns every client record, ordered by identifier.
    ///
    /// Full range scan; cost is O(n) in the number of stored documents.
    ///
    /// # Errors
    ///
    /// `Storage` on scan failure, `Codec` if a client-kind document fails
    /// to decode.
    pub fn list_records<S: WorldState>(&self, store: &S) -> Result<Vec<ClientRecord>> {
        self.scan_client_records(store)
    }

    /// Returns client records filtered by activation state.
    ///
    /// `None` returns all records, like [`list_records`](Self::list_records).
    ///
    /// # Errors
    ///
    /// Same as [`list_records`](Self::list_records).
    pub fn list_records_filtered<S: WorldState>(
        &self,
        store: &S,
        active: Option<bool>,
    ) -> Result<Vec<ClientRecord>> {
        let mut records = self.scan_client_records(store)?;
        if let Some(active) = active {
            records.retain(|r| r.is_active == active);
        }
        Ok(records)
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    fn load_record<S: WorldState>(&self, store: &S, id: &RecordId) -> Result<ClientRecord> {
        let bytes = store
            .get(id.as_str())
            .context(StorageSnafu)?
            .ok_or_else(|| EngineError::NotFound { id: id.as_str().to_string() })?;
        codec::decode(&bytes).context(CodecSnafu)
    }

    fn load_active_record<S: WorldState>(&self, store: &S, id: &RecordId) -> Result<ClientRecord> {
        let record = self.load_record(store, id)?;
        if !record.is_active {
            return Err(EngineError::InactiveRecord { id: id.as_str().to_string() });
        }
        Ok(record)
    }

    fn store_record<S: WorldState>(&self, store: &mut S, record: &ClientRecord) -> Result<()> {
        let bytes = codec::encode(record).context(CodecSnafu)?;
        store.put(record.id.as_str(), bytes).context(StorageSnafu)
    }

    /// Scans the full keyspace and decodes every client-kind document.
    ///
    /// Documents that fail the kind probe (other kinds, or bytes that are
    /// not client-shaped JSON) are skipped; a document that *is* client
    /// kind but fails full decode is a `Codec` error, never silently
    /// dropped.
    fn scan_client_records<S: WorldState>(&self, store: &S) -> Result<Vec<ClientRecord>> {
        let pairs = store.range_scan("", &prefix_end("")).context(StorageSnafu)?;
        let mut records = Vec::new();
        for (_key, bytes) in pairs {
            if codec::decode::<KindProbe>(&bytes).is_err() {
                continue;
            }
            records.push(codec::decode::<ClientRecord>(&bytes).context(CodecSnafu)?);
        }
        Ok(records)
    }
}
