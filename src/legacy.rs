// 📜 Legacy History - Flat-record adapter for homes predating the relational store
//
// One CSV row per owner, note or bare registration. Registration columns repeat
// on every row; group columns repeat on every owner row of the group. Legacy
// codes are translated here so the validators only ever see the modern shape.
//
// Columns:
//   mhr_number, reg_id, reg_type, doc_type, reg_date, reg_status, record,
//   group_id, tenancy, group_status, interest, can_reg_id, owner_id, party_type,
//   org_name, first_name, middle_name, last_name, description,
//   street, city, region, postal_code, country, note_type, note_status, expiry

use crate::entities::{
    Address, DocumentType, GroupStatus, Home, IndividualName, NoteStatus, NoteType, Owner,
    OwnerGroup, PartyType, Registration, RegistrationStatus, RegistrationType, TenancyType,
    UnitNote,
};
use crate::errors::{HistoryError, HistoryResult};
use crate::history::HistoryProvider;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct LegacyRecord {
    mhr_number: String,
    reg_id: u64,
    reg_type: String,
    #[serde(default)]
    doc_type: String,
    reg_date: String,
    reg_status: String,
    /// REG, OWNER or NOTE
    record: String,

    #[serde(default)]
    group_id: Option<u32>,
    #[serde(default)]
    tenancy: String,
    #[serde(default)]
    group_status: String,
    #[serde(default)]
    interest: String,
    /// Registration that retired the group
    #[serde(default)]
    can_reg_id: Option<u64>,

    #[serde(default)]
    owner_id: Option<u64>,
    #[serde(default)]
    party_type: String,
    #[serde(default)]
    org_name: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    middle_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    street: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    postal_code: String,
    #[serde(default)]
    country: String,

    #[serde(default)]
    note_type: String,
    #[serde(default)]
    note_status: String,
    #[serde(default)]
    expiry: String,
}

// ============================================================================
// LEGACY CODES
// ============================================================================

fn malformed(line: usize, reason: String) -> HistoryError {
    HistoryError::MalformedRecord { line, reason }
}

fn legacy_tenancy(code: &str, line: usize) -> HistoryResult<TenancyType> {
    match code {
        "SO" => Ok(TenancyType::Sole),
        "JT" => Ok(TenancyType::Joint),
        "TC" => Ok(TenancyType::Common),
        "NA" => Ok(TenancyType::Na),
        other => Err(malformed(line, format!("unknown tenancy code '{}'", other))),
    }
}

fn legacy_party_type(code: &str, is_business: bool, line: usize) -> HistoryResult<PartyType> {
    match code {
        "" if is_business => Ok(PartyType::OwnerBus),
        "" => Ok(PartyType::OwnerInd),
        "OI" => Ok(PartyType::OwnerInd),
        "OB" => Ok(PartyType::OwnerBus),
        "EX" => Ok(PartyType::Executor),
        "AD" => Ok(PartyType::Administrator),
        "TE" => Ok(PartyType::Trustee),
        "TR" => Ok(PartyType::Trust),
        other => Err(malformed(line, format!("unknown party type code '{}'", other))),
    }
}

fn legacy_group_status(code: &str, line: usize) -> HistoryResult<GroupStatus> {
    match code {
        "1" => Ok(GroupStatus::Draft),
        "3" => Ok(GroupStatus::Active),
        "4" => Ok(GroupStatus::Exempt),
        "5" => Ok(GroupStatus::Previous),
        other => Err(malformed(line, format!("unknown group status code '{}'", other))),
    }
}

fn legacy_registration_status(code: &str, line: usize) -> HistoryResult<RegistrationStatus> {
    match code {
        "R" => Ok(RegistrationStatus::Active),
        "E" => Ok(RegistrationStatus::Exempt),
        "C" => Ok(RegistrationStatus::Cancelled),
        "D" => Ok(RegistrationStatus::Draft),
        other => Err(malformed(line, format!("unknown registration status code '{}'", other))),
    }
}

fn legacy_note_status(code: &str, line: usize) -> HistoryResult<NoteStatus> {
    match code {
        "" | "A" => Ok(NoteStatus::Active),
        "C" => Ok(NoteStatus::Cancelled),
        "E" => Ok(NoteStatus::Expired),
        other => Err(malformed(line, format!("unknown note status code '{}'", other))),
    }
}

/// "UNDIVIDED 1/2", "1/2" or blank (no interest recorded).
pub fn parse_interest(text: &str) -> Option<(u32, u32)> {
    let text = text.trim();
    if text.is_empty() {
        return Some((0, 0));
    }
    let fraction = text.strip_prefix("UNDIVIDED").map_or(text, str::trim);
    let (numerator, denominator) = fraction.split_once('/')?;
    Some((numerator.trim().parse().ok()?, denominator.trim().parse().ok()?))
}

fn parse_legacy_date(value: &str, line: usize) -> HistoryResult<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| malformed(line, format!("invalid date '{}'", value)))
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

impl LegacyRecord {
    fn registration(&self, line: usize) -> HistoryResult<Registration> {
        let registration_type = RegistrationType::parse(&self.reg_type)
            .ok_or_else(|| malformed(line, format!("unknown registration type '{}'", self.reg_type)))?;
        let mut registration = Registration::new(
            self.reg_id,
            registration_type,
            parse_legacy_date(&self.reg_date, line)?,
            legacy_registration_status(&self.reg_status, line)?,
        );
        if !self.doc_type.is_empty() {
            registration.document_type = Some(
                DocumentType::parse(&self.doc_type)
                    .ok_or_else(|| malformed(line, format!("unknown document type '{}'", self.doc_type)))?,
            );
        }
        Ok(registration)
    }

    fn group(&self, group_id: u32, line: usize) -> HistoryResult<OwnerGroup> {
        let (numerator, denominator) = parse_interest(&self.interest)
            .ok_or_else(|| malformed(line, format!("malformed interest '{}'", self.interest)))?;
        let mut group = OwnerGroup::new(group_id, legacy_tenancy(&self.tenancy, line)?, Vec::new())
            .with_interest(numerator, denominator)
            .with_status(legacy_group_status(&self.group_status, line)?);
        group.registration_id = self.reg_id;
        Ok(group)
    }

    fn owner(self, line: usize) -> HistoryResult<Owner> {
        let is_business = !self.org_name.is_empty();
        let party_type = legacy_party_type(&self.party_type, is_business, line)?;

        let individual_name = if !is_business && !(self.first_name.is_empty() && self.last_name.is_empty()) {
            Some(IndividualName {
                first: self.first_name,
                middle: non_empty(self.middle_name),
                last: self.last_name,
            })
        } else {
            None
        };

        let has_address = [&self.street, &self.city, &self.region, &self.postal_code, &self.country]
            .iter()
            .any(|part| !part.is_empty());
        let address = if has_address {
            Some(Address {
                street: self.street,
                city: self.city,
                region: self.region,
                postal_code: self.postal_code,
                country: self.country,
            })
        } else {
            None
        };

        Ok(Owner {
            owner_id: self.owner_id,
            organization_name: non_empty(self.org_name),
            individual_name,
            party_type,
            description: non_empty(self.description),
            address,
            previous_owner_id: None,
            death: None,
        })
    }

    fn note(&self, line: usize) -> HistoryResult<UnitNote> {
        let document_type = NoteType::parse(&self.note_type)
            .ok_or_else(|| malformed(line, format!("unknown note type '{}'", self.note_type)))?;
        let mut note = UnitNote::new(self.reg_id, document_type);
        note.status = legacy_note_status(&self.note_status, line)?;
        if !self.expiry.is_empty() {
            note.expiry_date_time = Some(parse_legacy_date(&self.expiry, line)?);
        }
        Ok(note)
    }
}

// ============================================================================
// HOME ASSEMBLY
// ============================================================================

struct PendingGroup {
    group: OwnerGroup,
    retired_by: Option<u64>,
    line: usize,
}

#[derive(Default)]
struct HomeBuilder {
    registrations: BTreeMap<u64, Registration>,
    groups: Vec<PendingGroup>,
    group_positions: HashMap<u32, usize>,
}

impl HomeBuilder {
    fn add(&mut self, record: LegacyRecord, line: usize) -> HistoryResult<()> {
        if !self.registrations.contains_key(&record.reg_id) {
            self.registrations.insert(record.reg_id, record.registration(line)?);
        }

        let kind = record.record.clone();
        match kind.as_str() {
            "REG" => Ok(()),
            "NOTE" => {
                let note = record.note(line)?;
                if let Some(registration) = self.registrations.get_mut(&record.reg_id) {
                    registration.notes.push(note);
                }
                Ok(())
            }
            "OWNER" => {
                let group_id = record
                    .group_id
                    .ok_or_else(|| malformed(line, "owner row without group_id".to_string()))?;
                let position = match self.group_positions.get(&group_id).copied() {
                    Some(position) => position,
                    None => {
                        self.groups.push(PendingGroup {
                            group: record.group(group_id, line)?,
                            retired_by: record.can_reg_id,
                            line,
                        });
                        self.group_positions.insert(group_id, self.groups.len() - 1);
                        self.groups.len() - 1
                    }
                };
                let owner = record.owner(line)?;
                self.groups[position].group.owners.push(owner);
                Ok(())
            }
            other => Err(malformed(line, format!("unknown record type '{}'", other))),
        }
    }

    fn build(mut self, mhr_number: &str) -> HistoryResult<Home> {
        for pending in self.groups {
            let PendingGroup { mut group, retired_by, line } = pending;

            if let Some(change_id) = retired_by {
                if group.status == GroupStatus::Previous {
                    group.change_registration_id = Some(change_id);
                } else {
                    group.retire(change_id).map_err(|reason| malformed(line, reason))?;
                }
                let retiring = self.registrations.get_mut(&change_id).ok_or_else(|| {
                    malformed(line, format!("group {} retired by unknown registration {}", group.group_id, change_id))
                })?;
                retiring.deleted_group_ids.push(group.group_id);
            }

            let owning = self.registrations.get_mut(&group.registration_id).ok_or_else(|| {
                malformed(line, format!("group {} has no registration row", group.group_id))
            })?;
            owning.owner_groups.push(group);
        }

        let mut chain = self.registrations.into_values();
        let base = chain.next().ok_or_else(|| HistoryError::MissingBaseRegistration {
            mhr_number: mhr_number.to_string(),
        })?;
        let mut home = Home::new(mhr_number, base);
        home.changes = chain.collect();
        Ok(home)
    }
}

// ============================================================================
// PROVIDER
// ============================================================================

pub struct LegacyHistoryProvider {
    homes: BTreeMap<String, Home>,
}

impl LegacyHistoryProvider {
    pub fn from_path<P: AsRef<Path>>(path: P) -> HistoryResult<Self> {
        let file = File::open(path.as_ref())?;
        let provider = Self::from_reader(file)?;
        tracing::info!(path = ?path.as_ref(), homes = provider.len(), "loaded legacy records");
        Ok(provider)
    }

    pub fn from_reader<R: Read>(reader: R) -> HistoryResult<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = rdr.headers()?.clone();

        let mut builders: BTreeMap<String, HomeBuilder> = BTreeMap::new();
        for result in rdr.records() {
            let row = result?;
            let line = row.position().map_or(0, |p| p.line() as usize);
            let record: LegacyRecord = row
                .deserialize(Some(&headers))
                .map_err(|e| malformed(line, e.to_string()))?;

            builders
                .entry(record.mhr_number.clone())
                .or_default()
                .add(record, line)?;
        }

        let mut homes = BTreeMap::new();
        for (mhr_number, builder) in builders {
            let home = builder.build(&mhr_number)?;
            homes.insert(mhr_number, home);
        }
        Ok(LegacyHistoryProvider { homes })
    }

    pub fn homes(&self) -> impl Iterator<Item = &Home> {
        self.homes.values()
    }

    pub fn len(&self) -> usize {
        self.homes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.homes.is_empty()
    }
}

impl HistoryProvider for LegacyHistoryProvider {
    fn load_home(&self, mhr_number: &str) -> HistoryResult<Home> {
        self.homes
            .get(mhr_number)
            .cloned()
            .ok_or_else(|| HistoryError::NotFound {
                mhr_number: mhr_number.to_string(),
            })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::CurrentState;
    use crate::test_support::test_time;

    const HEADER: &str = "mhr_number,reg_id,reg_type,doc_type,reg_date,reg_status,record,group_id,tenancy,group_status,interest,can_reg_id,owner_id,party_type,org_name,first_name,middle_name,last_name,description,street,city,region,postal_code,country,note_type,note_status,expiry";

    fn create_test_csv(rows: &[&str]) -> String {
        let mut csv = String::from(HEADER);
        for row in rows {
            csv.push('\n');
            csv.push_str(row);
        }
        csv
    }

    fn load(rows: &[&str]) -> HistoryResult<LegacyHistoryProvider> {
        LegacyHistoryProvider::from_reader(create_test_csv(rows).as_bytes())
    }

    #[test]
    fn test_parse_interest() {
        assert_eq!(parse_interest("UNDIVIDED 1/2"), Some((1, 2)));
        assert_eq!(parse_interest("3/4"), Some((3, 4)));
        assert_eq!(parse_interest(""), Some((0, 0)));
        assert_eq!(parse_interest("HALF"), None);
        assert_eq!(parse_interest("UNDIVIDED 1/"), None);
    }

    #[test]
    fn test_load_transfer_history() {
        let provider = load(&[
            "022911,1001,MHREG,,1995-04-12,R,OWNER,1,JT,5,,1002,11,OI,,JOHN,,SMITH,,1 MAIN ST,VICTORIA,BC,V8R 3A5,CA,,,",
            "022911,1001,MHREG,,1995-04-12,R,OWNER,1,JT,5,,1002,12,OI,,JANE,A,SMITH,,1 MAIN ST,VICTORIA,BC,V8R 3A5,CA,,,",
            "022911,1002,TRANS,,2003-09-30,R,OWNER,2,TC,3,UNDIVIDED 1/2,,13,OB,ABC HOLDINGS LTD,,,,,2 MAIN ST,VICTORIA,BC,V8R 3A5,CA,,,",
            "022911,1002,TRANS,,2003-09-30,R,OWNER,3,TC,3,UNDIVIDED 1/2,,14,,,BOB,,JONES,,,,,,,,,",
            "022911,1002,TRANS,,2003-09-30,R,NOTE,,,,,,,,,,,,,,,,,,CAU,A,",
        ])
        .unwrap();

        let home = provider.load_home("022911").unwrap();
        assert_eq!(home.base.id, 1001);
        assert_eq!(home.changes.len(), 1);
        assert_eq!(home.changes[0].deleted_group_ids, vec![1]);

        let current: Vec<u32> = home.current_groups().iter().map(|g| g.group_id).collect();
        assert_eq!(current, vec![2, 3]);

        let jane = home.find_owner(12).unwrap();
        assert_eq!(jane.individual_name.as_ref().unwrap().middle.as_deref(), Some("A"));
        let bob = home.find_owner(14).unwrap();
        assert_eq!(bob.party_type, PartyType::OwnerInd);
        assert!(bob.address.is_none());

        let group = home.find_group(2).unwrap();
        assert_eq!((group.interest_numerator, group.interest_denominator), (1, 2));
        assert_eq!(group.owners[0].party_type, PartyType::OwnerBus);

        let state = CurrentState::project(&home, test_time());
        assert_eq!(state.notes.len(), 1);
        assert_eq!(state.find_group(1).unwrap().change_registration_id, Some(1002));
    }

    #[test]
    fn test_stale_active_group_retired() {
        let provider = load(&[
            "000100,1,MHREG,,1990-01-01,R,OWNER,1,SO,3,,2,1,OI,,JOHN,,SMITH,,,,,,,,,",
            "000100,2,TRANS,,2000-01-01,R,OWNER,2,SO,3,,,2,OB,ABC LTD,,,,,,,,,,,,",
        ])
        .unwrap();

        let home = provider.load_home("000100").unwrap();
        let retired = home.find_group(1).unwrap();
        assert_eq!(retired.status, GroupStatus::Previous);
        assert_eq!(retired.change_registration_id, Some(2));
    }

    #[test]
    fn test_malformed_interest_rejected() {
        let result = load(&[
            "000100,1,MHREG,,1990-01-01,R,OWNER,1,TC,3,HALF,,1,OI,,JOHN,,SMITH,,,,,,,,,",
        ]);

        match result {
            Err(HistoryError::MalformedRecord { line, reason }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("HALF"));
            }
            other => panic!("expected malformed record, got {:?}", other.map(|p| p.len())),
        }
    }

    #[test]
    fn test_unknown_codes_rejected() {
        let bad_tenancy = load(&["000100,1,MHREG,,1990-01-01,R,OWNER,1,XX,3,,,1,OI,,JOHN,,SMITH,,,,,,,,,"]);
        let bad_party = load(&["000100,1,MHREG,,1990-01-01,R,OWNER,1,SO,3,,,1,ZZ,,JOHN,,SMITH,,,,,,,,,"]);
        let bad_status = load(&["000100,1,MHREG,,1990-01-01,R,OWNER,1,SO,9,,,1,OI,,JOHN,,SMITH,,,,,,,,,"]);

        assert!(matches!(bad_tenancy, Err(HistoryError::MalformedRecord { .. })));
        assert!(matches!(bad_party, Err(HistoryError::MalformedRecord { .. })));
        assert!(matches!(bad_status, Err(HistoryError::MalformedRecord { .. })));
    }

    #[test]
    fn test_retired_by_unknown_registration() {
        let result = load(&["000100,1,MHREG,,1990-01-01,R,OWNER,1,SO,5,,7,1,OI,,JOHN,,SMITH,,,,,,,,,"]);
        assert!(matches!(result, Err(HistoryError::MalformedRecord { .. })));
    }

    #[test]
    fn test_unknown_home() {
        let provider = load(&[]).unwrap();
        assert!(provider.is_empty());
        assert!(matches!(provider.load_home("000100"), Err(HistoryError::NotFound { .. })));
    }
}
