//! The built-in legal intake questionnaire.

use crate::error::FlowError;

use super::model::{FlowTable, QuestionNode};

/// Build the nine-question legal intake flow.
pub fn legal_intake_nodes() -> Vec<QuestionNode> {
    vec![
        QuestionNode::choice(
            "start",
            "Hello! I'm your legal assistant. To help you better, could you tell me what type of legal issue you're facing?",
            "legalIssueType",
            [
                "Family Law",
                "Criminal Defense",
                "Personal Injury",
                "Business Law",
                "Immigration",
                "Real Estate",
                "Other",
            ],
        )
        .then("duration"),
        QuestionNode::choice(
            "duration",
            "How long have you been dealing with this issue?",
            "issueDuration",
            [
                "Less than a week",
                "A few weeks",
                "1-3 months",
                "3-6 months",
                "6-12 months",
                "More than a year",
            ],
        )
        .then("urgency"),
        QuestionNode::choice(
            "urgency",
            "Is this matter urgent? Do you have any upcoming deadlines or court dates?",
            "urgencyLevel",
            [
                "Yes, within 24 hours",
                "Yes, within a week",
                "Yes, within a month",
                "No immediate urgency",
            ],
        )
        .then("description"),
        QuestionNode::open(
            "description",
            "Please briefly describe your situation in a few sentences.",
            "situationDescription",
        )
        .then("previousAction"),
        QuestionNode::choice(
            "previousAction",
            "Have you taken any steps to address this issue so far?",
            "previousActions",
            [
                "Consulted with another lawyer",
                "Filed documents myself",
                "Contacted relevant authorities",
                "Attempted to resolve directly",
                "No action taken yet",
                "Other",
            ],
        )
        .then("location"),
        QuestionNode::open(
            "location",
            "What city and state are you located in? This helps us determine relevant jurisdiction.",
            "location",
        )
        .then("contactPreference"),
        QuestionNode::choice(
            "contactPreference",
            "What's your preferred method of communication with a legal professional?",
            "contactPreference",
            [
                "Phone call",
                "Email",
                "Video consultation",
                "In-person meeting",
                "Text message",
            ],
        )
        .then("budget"),
        QuestionNode::choice(
            "budget",
            "Do you have a budget in mind for legal services?",
            "budget",
            [
                "Under $500",
                "$500-$1,000",
                "$1,000-$3,000",
                "$3,000-$5,000",
                "$5,000+",
                "Seeking pro bono (free) assistance",
                "Not sure/need guidance",
            ],
        )
        .then("end"),
        QuestionNode::open(
            "end",
            "Thank you for providing this information. Our team will review your case and a legal expert will contact you shortly. Is there anything else you'd like to add before we conclude?",
            "additionalInfo",
        ),
    ]
}

/// The built-in flow, validated.
pub fn legal_intake_flow() -> Result<FlowTable, FlowError> {
    FlowTable::new(legal_intake_nodes())
}
