// Contact store - persisted emergency contacts
use crate::application::persistence::{KeyValueStore, StoreKey, load_or_default, save_typed};
use crate::domain::contact::{ContactError, ContactList, EmergencyContact};
use std::sync::{Arc, Mutex, MutexGuard};

pub struct ContactStore {
    store: Arc<dyn KeyValueStore>,
    contacts: Mutex<ContactList>,
}

impl ContactStore {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let contacts: ContactList = load_or_default(store.as_ref(), StoreKey::EmergencyContacts);
        Self {
            store,
            contacts: Mutex::new(contacts),
        }
    }

    pub fn list(&self) -> Vec<EmergencyContact> {
        self.lock().as_slice().to_vec()
    }

    pub fn phone_numbers(&self) -> Vec<String> {
        self.lock().phone_numbers()
    }

    pub fn add(&self, contact: EmergencyContact) -> Result<(), ContactError> {
        let mut contacts = self.lock();
        let mut updated = contacts.clone();
        updated.add(contact)?;
        self.persist(&updated)?;
        *contacts = updated;
        Ok(())
    }

    pub fn remove_by_name(&self, name: &str) -> Result<EmergencyContact, ContactError> {
        let mut contacts = self.lock();
        let mut updated = contacts.clone();
        let removed = updated.remove_by_name(name)?;
        self.persist(&updated)?;
        *contacts = updated;
        Ok(removed)
    }

    fn persist(&self, contacts: &ContactList) -> Result<(), ContactError> {
        save_typed(self.store.as_ref(), StoreKey::EmergencyContacts, contacts).map_err(|e| {
            tracing::error!("Failed to save contacts: {}", e);
            ContactError::Persistence(e.to_string())
        })
    }

    fn lock(&self) -> MutexGuard<'_, ContactList> {
        self.contacts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
