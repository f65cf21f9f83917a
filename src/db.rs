// 🗄️ SQLite History - Relational store for registration chains
//
// One row per registration, owner group, owner and unit note, keyed by MHR
// number. Registrations keep their chain position in `seq` (0 = base).

use crate::entities::{
    DocumentType, GroupStatus, Home, IndividualName, NoteStatus, NoteType, Owner, OwnerGroup,
    PartyType, Registration, RegistrationStatus, RegistrationType, TenancyType, UnitNote,
};
use crate::errors::{HistoryError, HistoryResult};
use crate::history::HistoryProvider;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;

pub fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS registrations (
            id INTEGER PRIMARY KEY,
            mhr_number TEXT NOT NULL,
            seq INTEGER NOT NULL,
            registration_type TEXT NOT NULL,
            document_type TEXT,
            registration_ts TEXT NOT NULL,
            status TEXT NOT NULL,
            deleted_group_ids TEXT NOT NULL DEFAULT '[]'
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS owner_groups (
            mhr_number TEXT NOT NULL,
            group_id INTEGER NOT NULL,
            registration_id INTEGER NOT NULL,
            change_registration_id INTEGER,
            tenancy_type TEXT NOT NULL,
            status TEXT NOT NULL,
            interest_numerator INTEGER NOT NULL DEFAULT 0,
            interest_denominator INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (mhr_number, group_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS owners (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            mhr_number TEXT NOT NULL,
            group_id INTEGER NOT NULL,
            seq INTEGER NOT NULL,
            owner_id INTEGER,
            organization_name TEXT,
            first_name TEXT,
            middle_name TEXT,
            last_name TEXT,
            party_type TEXT NOT NULL,
            description TEXT,
            address TEXT,
            death TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS unit_notes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            mhr_number TEXT NOT NULL,
            registration_id INTEGER NOT NULL,
            document_type TEXT NOT NULL,
            status TEXT NOT NULL,
            expiry_date_time TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_registrations_mhr ON registrations(mhr_number, seq)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_owners_group ON owners(mhr_number, group_id, seq)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_notes_mhr ON unit_notes(mhr_number, registration_id)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// RAW ROWS
// ============================================================================

struct RegistrationRow {
    id: i64,
    seq: i64,
    registration_type: String,
    document_type: Option<String>,
    registration_ts: String,
    status: String,
    deleted_group_ids: String,
}

struct GroupRow {
    group_id: u32,
    registration_id: i64,
    change_registration_id: Option<i64>,
    tenancy_type: String,
    status: String,
    interest_numerator: u32,
    interest_denominator: u32,
}

struct OwnerRow {
    group_id: u32,
    owner_id: Option<i64>,
    organization_name: Option<String>,
    first_name: Option<String>,
    middle_name: Option<String>,
    last_name: Option<String>,
    party_type: String,
    description: Option<String>,
    address: Option<String>,
    death: Option<String>,
}

struct NoteRow {
    registration_id: i64,
    document_type: String,
    status: String,
    expiry_date_time: Option<String>,
}

fn parse_code<T>(field: &'static str, code: &str, parse: fn(&str) -> Option<T>) -> HistoryResult<T> {
    parse(code).ok_or_else(|| HistoryError::UnknownCode {
        field,
        code: code.to_string(),
    })
}

fn parse_timestamp(value: &str) -> HistoryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| HistoryError::InvalidTimestamp {
            value: value.to_string(),
        })
}

impl RegistrationRow {
    fn into_registration(self) -> HistoryResult<Registration> {
        let mut registration = Registration::new(
            self.id as u64,
            parse_code("registration type", &self.registration_type, RegistrationType::parse)?,
            parse_timestamp(&self.registration_ts)?,
            parse_code("registration status", &self.status, RegistrationStatus::parse)?,
        );
        registration.document_type = match self.document_type.as_deref() {
            Some(code) => Some(parse_code("document type", code, DocumentType::parse)?),
            None => None,
        };
        registration.deleted_group_ids = serde_json::from_str(&self.deleted_group_ids)?;
        Ok(registration)
    }
}

impl OwnerRow {
    fn into_owner(self) -> HistoryResult<Owner> {
        let individual_name = match (self.first_name, self.last_name) {
            (Some(first), Some(last)) => Some(IndividualName {
                first,
                middle: self.middle_name,
                last,
            }),
            _ => None,
        };
        Ok(Owner {
            owner_id: self.owner_id.map(|id| id as u64),
            organization_name: self.organization_name,
            individual_name,
            party_type: parse_code("party type", &self.party_type, PartyType::parse)?,
            description: self.description,
            address: self.address.as_deref().map(serde_json::from_str).transpose()?,
            previous_owner_id: None,
            death: self.death.as_deref().map(serde_json::from_str).transpose()?,
        })
    }
}

// ============================================================================
// PROVIDER
// ============================================================================

pub struct SqliteHistoryProvider {
    conn: Connection,
}

impl SqliteHistoryProvider {
    pub fn open<P: AsRef<Path>>(path: P) -> HistoryResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> HistoryResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> HistoryResult<Self> {
        setup_database(&conn)?;
        Ok(SqliteHistoryProvider { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Store a home's full chain, replacing whatever was stored for its MHR number.
    pub fn save_home(&mut self, home: &Home) -> HistoryResult<()> {
        let mhr = home.mhr_number.as_str();
        let tx = self.conn.transaction()?;

        for table in ["registrations", "owner_groups", "owners", "unit_notes"] {
            tx.execute(&format!("DELETE FROM {} WHERE mhr_number = ?1", table), params![mhr])?;
        }

        for (seq, registration) in home.registrations().enumerate() {
            tx.execute(
                "INSERT INTO registrations (
                    id, mhr_number, seq, registration_type, document_type,
                    registration_ts, status, deleted_group_ids
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    registration.id as i64,
                    mhr,
                    seq as i64,
                    registration.registration_type.as_str(),
                    registration.document_type.map(|d| d.as_str()),
                    registration.registration_ts.to_rfc3339(),
                    registration.status.as_str(),
                    serde_json::to_string(&registration.deleted_group_ids)?,
                ],
            )?;

            for group in &registration.owner_groups {
                tx.execute(
                    "INSERT INTO owner_groups (
                        mhr_number, group_id, registration_id, change_registration_id,
                        tenancy_type, status, interest_numerator, interest_denominator
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        mhr,
                        group.group_id,
                        registration.id as i64,
                        group.change_registration_id.map(|id| id as i64),
                        group.tenancy_type.as_str(),
                        group.status.as_str(),
                        group.interest_numerator,
                        group.interest_denominator,
                    ],
                )?;

                for (owner_seq, owner) in group.owners.iter().enumerate() {
                    let name = owner.individual_name.as_ref();
                    tx.execute(
                        "INSERT INTO owners (
                            mhr_number, group_id, seq, owner_id, organization_name,
                            first_name, middle_name, last_name, party_type, description,
                            address, death
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                        params![
                            mhr,
                            group.group_id,
                            owner_seq as i64,
                            owner.owner_id.map(|id| id as i64),
                            owner.organization_name,
                            name.map(|n| n.first.as_str()),
                            name.and_then(|n| n.middle.as_deref()),
                            name.map(|n| n.last.as_str()),
                            owner.party_type.as_str(),
                            owner.description,
                            owner.address.as_ref().map(serde_json::to_string).transpose()?,
                            owner.death.as_ref().map(serde_json::to_string).transpose()?,
                        ],
                    )?;
                }
            }

            for note in &registration.notes {
                tx.execute(
                    "INSERT INTO unit_notes (
                        mhr_number, registration_id, document_type, status, expiry_date_time
                    ) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        mhr,
                        registration.id as i64,
                        note.document_type.as_str(),
                        note.status.as_str(),
                        note.expiry_date_time.map(|dt| dt.to_rfc3339()),
                    ],
                )?;
            }
        }

        tx.commit()?;
        tracing::info!(
            mhr_number = mhr,
            registrations = home.changes.len() + 1,
            "saved home history"
        );
        Ok(())
    }

    /// Number of distinct homes stored.
    pub fn home_count(&self) -> HistoryResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT mhr_number) FROM registrations",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn load_registrations(&self, mhr_number: &str) -> HistoryResult<Vec<RegistrationRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, seq, registration_type, document_type, registration_ts, status, deleted_group_ids
             FROM registrations
             WHERE mhr_number = ?1
             ORDER BY seq",
        )?;

        let rows = stmt
            .query_map(params![mhr_number], |row| {
                Ok(RegistrationRow {
                    id: row.get(0)?,
                    seq: row.get(1)?,
                    registration_type: row.get(2)?,
                    document_type: row.get(3)?,
                    registration_ts: row.get(4)?,
                    status: row.get(5)?,
                    deleted_group_ids: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn load_groups(&self, mhr_number: &str) -> HistoryResult<Vec<GroupRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT group_id, registration_id, change_registration_id, tenancy_type, status,
                    interest_numerator, interest_denominator
             FROM owner_groups
             WHERE mhr_number = ?1
             ORDER BY group_id",
        )?;

        let rows = stmt
            .query_map(params![mhr_number], |row| {
                Ok(GroupRow {
                    group_id: row.get(0)?,
                    registration_id: row.get(1)?,
                    change_registration_id: row.get(2)?,
                    tenancy_type: row.get(3)?,
                    status: row.get(4)?,
                    interest_numerator: row.get(5)?,
                    interest_denominator: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn load_owners(&self, mhr_number: &str) -> HistoryResult<Vec<OwnerRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT group_id, owner_id, organization_name, first_name, middle_name, last_name,
                    party_type, description, address, death
             FROM owners
             WHERE mhr_number = ?1
             ORDER BY group_id, seq",
        )?;

        let rows = stmt
            .query_map(params![mhr_number], |row| {
                Ok(OwnerRow {
                    group_id: row.get(0)?,
                    owner_id: row.get(1)?,
                    organization_name: row.get(2)?,
                    first_name: row.get(3)?,
                    middle_name: row.get(4)?,
                    last_name: row.get(5)?,
                    party_type: row.get(6)?,
                    description: row.get(7)?,
                    address: row.get(8)?,
                    death: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn load_notes(&self, mhr_number: &str) -> HistoryResult<Vec<NoteRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT registration_id, document_type, status, expiry_date_time
             FROM unit_notes
             WHERE mhr_number = ?1
             ORDER BY id",
        )?;

        let rows = stmt
            .query_map(params![mhr_number], |row| {
                Ok(NoteRow {
                    registration_id: row.get(0)?,
                    document_type: row.get(1)?,
                    status: row.get(2)?,
                    expiry_date_time: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

impl HistoryProvider for SqliteHistoryProvider {
    fn load_home(&self, mhr_number: &str) -> HistoryResult<Home> {
        let registration_rows = self.load_registrations(mhr_number)?;
        match registration_rows.first() {
            None => {
                return Err(HistoryError::NotFound {
                    mhr_number: mhr_number.to_string(),
                })
            }
            Some(first) if first.seq != 0 => {
                return Err(HistoryError::MissingBaseRegistration {
                    mhr_number: mhr_number.to_string(),
                })
            }
            Some(_) => {}
        }

        let mut registrations = registration_rows
            .into_iter()
            .map(RegistrationRow::into_registration)
            .collect::<HistoryResult<Vec<_>>>()?;
        let position: HashMap<u64, usize> = registrations
            .iter()
            .enumerate()
            .map(|(index, r)| (r.id, index))
            .collect();

        let mut owners_by_group: HashMap<u32, Vec<Owner>> = HashMap::new();
        for row in self.load_owners(mhr_number)? {
            let group_id = row.group_id;
            owners_by_group.entry(group_id).or_default().push(row.into_owner()?);
        }

        for row in self.load_groups(mhr_number)? {
            let registration_id = row.registration_id as u64;
            let index = position.get(&registration_id).copied().ok_or_else(|| HistoryError::Inconsistent {
                mhr_number: mhr_number.to_string(),
                reason: format!(
                    "owner group {} references unknown registration {}",
                    row.group_id, registration_id
                ),
            })?;

            let mut group = OwnerGroup::new(
                row.group_id,
                parse_code("tenancy type", &row.tenancy_type, TenancyType::parse)?,
                owners_by_group.remove(&row.group_id).unwrap_or_default(),
            )
            .with_interest(row.interest_numerator, row.interest_denominator)
            .with_status(parse_code("group status", &row.status, GroupStatus::parse)?);
            group.registration_id = registration_id;
            group.change_registration_id = row.change_registration_id.map(|id| id as u64);

            registrations[index].owner_groups.push(group);
        }

        for row in self.load_notes(mhr_number)? {
            let registration_id = row.registration_id as u64;
            let index = position.get(&registration_id).copied().ok_or_else(|| HistoryError::Inconsistent {
                mhr_number: mhr_number.to_string(),
                reason: format!("unit note references unknown registration {}", registration_id),
            })?;

            let mut note = UnitNote::new(
                registration_id,
                parse_code("note type", &row.document_type, NoteType::parse)?,
            );
            note.status = parse_code("note status", &row.status, NoteStatus::parse)?;
            note.expiry_date_time = row.expiry_date_time.as_deref().map(parse_timestamp).transpose()?;

            registrations[index].notes.push(note);
        }

        let mut chain = registrations.into_iter();
        let base = chain.next().ok_or_else(|| HistoryError::MissingBaseRegistration {
            mhr_number: mhr_number.to_string(),
        })?;
        let mut home = Home::new(mhr_number, base);
        home.changes = chain.collect();

        tracing::info!(
            mhr_number,
            registrations = home.changes.len() + 1,
            "loaded home history from database"
        );
        Ok(home)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Address, DeathDetails};
    use crate::test_support::*;

    fn create_test_history() -> Home {
        let mut home = create_test_home(vec![joint_group(1, vec![
            individual_owner(1, "JOHN", "SMITH"),
            individual_owner(2, "JANE", "SMITH"),
        ])]);
        home.base.notes = vec![UnitNote::new(BASE_REGISTRATION_ID, NoteType::Caution)];

        let mut transfer = Registration::new(
            200,
            RegistrationType::TransferDeath,
            test_time(),
            RegistrationStatus::Active,
        );
        transfer.deleted_group_ids = vec![1];
        let mut survivor = individual_owner(3, "JANE", "SMITH");
        survivor.address = Some(Address {
            street: "99 HARBOUR ROAD".to_string(),
            ..test_address()
        });
        transfer.owner_groups = vec![with_registration(sole_group(2, survivor), 200)];
        home.changes.push(transfer);
        home
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let mut provider = SqliteHistoryProvider::open_in_memory().unwrap();
        let home = create_test_history();

        provider.save_home(&home).unwrap();
        let loaded = provider.load_home(TEST_MHR_NUMBER).unwrap();

        assert_eq!(loaded, home);
        assert_eq!(provider.home_count().unwrap(), 1);
    }

    #[test]
    fn test_save_twice_replaces() {
        let mut provider = SqliteHistoryProvider::open_in_memory().unwrap();
        let mut home = create_test_history();
        provider.save_home(&home).unwrap();

        home.changes.clear();
        provider.save_home(&home).unwrap();

        let loaded = provider.load_home(TEST_MHR_NUMBER).unwrap();
        assert!(loaded.changes.is_empty());
        assert_eq!(loaded.current_groups().len(), 1);
        assert_eq!(provider.home_count().unwrap(), 1);
    }

    #[test]
    fn test_death_details_persisted() {
        let mut provider = SqliteHistoryProvider::open_in_memory().unwrap();
        let mut deceased = individual_owner(1, "JOHN", "SMITH");
        deceased.death = Some(DeathDetails {
            certificate_number: "232200001".to_string(),
            death_date_time: test_time(),
        });
        let home = create_test_home(vec![sole_group(1, deceased.clone())]);

        provider.save_home(&home).unwrap();
        let loaded = provider.load_home(TEST_MHR_NUMBER).unwrap();
        assert_eq!(loaded.find_owner(1), Some(&deceased));
    }

    #[test]
    fn test_unknown_home() {
        let provider = SqliteHistoryProvider::open_in_memory().unwrap();
        let result = provider.load_home("123456");

        assert!(matches!(result, Err(HistoryError::NotFound { .. })));
    }

    #[test]
    fn test_unknown_code_rejected() {
        let mut provider = SqliteHistoryProvider::open_in_memory().unwrap();
        provider.save_home(&create_test_history()).unwrap();
        provider
            .connection()
            .execute("UPDATE owner_groups SET tenancy_type = 'XX' WHERE group_id = 1", [])
            .unwrap();

        let result = provider.load_home(TEST_MHR_NUMBER);
        assert!(matches!(result, Err(HistoryError::UnknownCode { field: "tenancy type", .. })));
    }

    #[test]
    fn test_orphan_group_is_inconsistent() {
        let mut provider = SqliteHistoryProvider::open_in_memory().unwrap();
        provider.save_home(&create_test_history()).unwrap();
        provider
            .connection()
            .execute("UPDATE owner_groups SET registration_id = 999 WHERE group_id = 2", [])
            .unwrap();

        let result = provider.load_home(TEST_MHR_NUMBER);
        assert!(matches!(result, Err(HistoryError::Inconsistent { .. })));
    }
}
