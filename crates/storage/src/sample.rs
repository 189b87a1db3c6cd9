//! Built-in starter bank, seeded into an empty database.

use quiz_core::model::{AnswerDraft, ChoiceDraft, KindDraft, QuestionDraft, QuestionId};
use uuid::Uuid;

fn choices(items: &[(&str, &str)]) -> Option<Vec<ChoiceDraft>> {
    Some(
        items
            .iter()
            .map(|(id, content)| ChoiceDraft {
                id: (*id).to_string(),
                content: (*content).to_string(),
            })
            .collect(),
    )
}

fn tags(items: &[&str]) -> Vec<String> {
    items.iter().map(|t| (*t).to_string()).collect()
}

/// The starter questions: one of each answer modality.
#[must_use]
pub fn sample_questions() -> Vec<QuestionDraft> {
    vec![
        QuestionDraft {
            id: QuestionId::new(1),
            uuid: Uuid::from_u128(0x550e_8400_e29b_41d4_a716_4466_5544_0001),
            title: "What is the prototype chain in JavaScript?".into(),
            content: "Explain the **prototype chain** and how it relates to inheritance.".into(),
            kind: KindDraft::Name("textAnswer".into()),
            difficulty: 2,
            choices: None,
            correct_answer: AnswerDraft::One(
                "The prototype chain is how JavaScript implements inheritance. Every object \
                 has a prototype it inherits properties and methods from, and that prototype \
                 may have its own prototype, forming a chain."
                    .into(),
            ),
            hint: Some("Think about objects, prototypes and `__proto__`.".into()),
            source: Some("Professional JavaScript for Web Developers".into()),
            is_official: true,
            submit_count: 283,
            tags: tags(&["JavaScript", "Prototype", "Inheritance"]),
        },
        QuestionDraft {
            id: QuestionId::new(2),
            uuid: Uuid::from_u128(0x550e_8400_e29b_41d4_a716_4466_5544_0002),
            title: "What is the virtual DOM in React?".into(),
            content: "Pick the correct description of React's virtual DOM:".into(),
            kind: KindDraft::Name("singleChoice".into()),
            difficulty: 2,
            choices: choices(&[
                ("A", "The virtual DOM is a real DOM node"),
                ("B", "A JavaScript object that lightly describes the UI"),
                ("C", "It calls the browser DOM API directly"),
                ("D", "It can only be used with React"),
            ]),
            correct_answer: AnswerDraft::One("B".into()),
            hint: Some("Consider how the virtual DOM is implemented.".into()),
            source: Some("React documentation".into()),
            is_official: true,
            submit_count: 456,
            tags: tags(&["React", "Virtual DOM", "Frontend"]),
        },
        QuestionDraft {
            id: QuestionId::new(3),
            uuid: Uuid::from_u128(0x550e_8400_e29b_41d4_a716_4466_5544_0003),
            title: "CSS Flexbox layout".into(),
            content: "Which of these are valid CSS Flexbox properties? (select all)".into(),
            kind: KindDraft::Name("multipleChoice".into()),
            difficulty: 1,
            choices: choices(&[
                ("A", "`justify-content`"),
                ("B", "`align-items`"),
                ("C", "`flex-direction`"),
                ("D", "`grid-template-columns`"),
            ]),
            correct_answer: AnswerDraft::Many(tags(&["A", "B", "C"])),
            hint: Some("Grid and Flexbox are different layout systems.".into()),
            source: Some("MDN Web Docs".into()),
            is_official: true,
            submit_count: 234,
            tags: tags(&["CSS", "Flexbox", "Layout"]),
        },
    ]
}
