use crossterm::event::{Event, KeyEvent};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::contact::Contact;

/// The five inputs of the contact form, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Name,
    Email,
    FatherName,
    Phone,
    Dob,
}

impl FormField {
    pub const ALL: [FormField; 5] = [
        FormField::Name,
        FormField::Email,
        FormField::FatherName,
        FormField::Phone,
        FormField::Dob,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Name => "Name",
            FormField::Email => "Email",
            FormField::FatherName => "Father Name",
            FormField::Phone => "Phone",
            FormField::Dob => "DOB",
        }
    }

    pub fn index(self) -> usize {
        match self {
            FormField::Name => 0,
            FormField::Email => 1,
            FormField::FatherName => 2,
            FormField::Phone => 3,
            FormField::Dob => 4,
        }
    }

    /// Get the next field, or None if at the end
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Get the previous field, or None if at the beginning
    pub fn prev(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }
}

/// Text inputs backing the form.
#[derive(Debug, Default)]
pub struct ContactForm {
    inputs: [Input; 5],
}

impl ContactForm {
    pub fn value(&self, field: FormField) -> &str {
        self.inputs[field.index()].value()
    }

    pub fn set(&mut self, field: FormField, value: &str) {
        self.inputs[field.index()] = Input::new(value.to_string());
    }

    pub fn visual_cursor(&self, field: FormField) -> usize {
        self.inputs[field.index()].visual_cursor()
    }

    /// Copy every field of `contact` into the form.
    pub fn populate(&mut self, contact: &Contact) {
        self.set(FormField::Name, &contact.name);
        self.set(FormField::Email, &contact.email);
        self.set(FormField::FatherName, &contact.father_name);
        self.set(FormField::Phone, &contact.phone);
        self.set(FormField::Dob, &contact.dob);
    }

    pub fn clear(&mut self) {
        for input in &mut self.inputs {
            input.reset();
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.inputs.iter().all(|input| input.value().is_empty())
    }

    /// Raw field values as a record; nothing is validated here.
    pub fn to_contact(&self) -> Contact {
        Contact::new(
            self.value(FormField::Name),
            self.value(FormField::Email),
            self.value(FormField::FatherName),
            self.value(FormField::Phone),
            self.value(FormField::Dob),
        )
    }

    pub fn handle_key_event(&mut self, field: FormField, key: KeyEvent) -> bool {
        self.inputs[field.index()]
            .handle_event(&Event::Key(key))
            .is_some()
    }
}

/// A record taken out of the store by Edit and not yet resubmitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    pub contact: Contact,
    /// Position the record held before it was removed.
    pub index: usize,
}
