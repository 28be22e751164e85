// Emergency contact domain model
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContactError {
    #[error("Please enter both name and phone number")]
    MissingField,
    #[error("a contact named '{0}' already exists")]
    Duplicate(String),
    #[error("no contact named '{0}'")]
    NotFound(String),
    #[error("contacts could not be saved: {0}")]
    Persistence(String),
}

impl EmergencyContact {
    /// Trims both fields; rejects either being empty.
    pub fn new(name: &str, phone: &str) -> Result<Self, ContactError> {
        let name = name.trim();
        let phone = phone.trim();

        if name.is_empty() || phone.is_empty() {
            return Err(ContactError::MissingField);
        }

        Ok(Self {
            name: name.to_string(),
            phone: phone.to_string(),
        })
    }
}

/// Insertion-ordered contacts, unique by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactList {
    contacts: Vec<EmergencyContact>,
}

impl ContactList {
    pub fn add(&mut self, contact: EmergencyContact) -> Result<(), ContactError> {
        if self.contacts.iter().any(|c| c.name == contact.name) {
            return Err(ContactError::Duplicate(contact.name));
        }
        self.contacts.push(contact);
        Ok(())
    }

    pub fn remove_by_name(&mut self, name: &str) -> Result<EmergencyContact, ContactError> {
        let idx = self
            .contacts
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| ContactError::NotFound(name.to_string()))?;
        Ok(self.contacts.remove(idx))
    }

    pub fn as_slice(&self) -> &[EmergencyContact] {
        &self.contacts
    }

    /// Phone numbers in insertion order, skipping blank entries from older stores.
    pub fn phone_numbers(&self) -> Vec<String> {
        self.contacts
            .iter()
            .map(|c| c.phone.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_fields_are_trimmed() {
        let contact = EmergencyContact::new("  Mum ", " +44 7700 900123 ").unwrap();
        assert_eq!(contact.name, "Mum");
        assert_eq!(contact.phone, "+44 7700 900123");

        assert_eq!(EmergencyContact::new("   ", "123"), Err(ContactError::MissingField));
        assert_eq!(EmergencyContact::new("Dad", ""), Err(ContactError::MissingField));
    }

    #[test]
    fn test_names_are_unique() {
        let mut list = ContactList::default();
        list.add(EmergencyContact::new("Mum", "111").unwrap()).unwrap();

        let err = list.add(EmergencyContact::new("Mum", "222").unwrap()).unwrap_err();
        assert_eq!(err, ContactError::Duplicate("Mum".to_string()));
        assert_eq!(list.as_slice().len(), 1);
    }

    #[test]
    fn test_remove_and_phone_numbers() {
        let mut list = ContactList::default();
        list.add(EmergencyContact::new("Mum", "111").unwrap()).unwrap();
        list.add(EmergencyContact::new("Dad", "222").unwrap()).unwrap();
        list.add(EmergencyContact::new("Sis", "333").unwrap()).unwrap();

        list.remove_by_name("Dad").unwrap();
        assert_eq!(list.phone_numbers(), vec!["111", "333"]);
        assert!(matches!(list.remove_by_name("Dad"), Err(ContactError::NotFound(_))));
    }

    #[test]
    fn test_legacy_blank_phone_is_skipped() {
        let list: ContactList =
            serde_json::from_str(r#"[{"name":"Old","phone":""},{"name":"Mum","phone":"111"}]"#)
                .unwrap();
        assert_eq!(list.phone_numbers(), vec!["111"]);
    }
}
