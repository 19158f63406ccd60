use serde_json::{json, Value};

/// Canned dashboard snapshot for the demo principal console. Static content
/// parameterized by class, standing in for the school's live records.
pub fn dashboard(class_id: &str) -> Value {
    let mut sections = serde_json::Map::new();
    sections.insert(
        format!("{}A", class_id),
        json!({ "avgScore": 72, "riskCount": 5, "activeChapter": "Polynomials" }),
    );
    sections.insert(
        format!("{}B", class_id),
        json!({ "avgScore": 64, "riskCount": 12, "activeChapter": "Polynomials" }),
    );
    sections.insert(
        format!("{}C", class_id),
        json!({ "avgScore": 81, "riskCount": 2, "activeChapter": "Force and Laws of Motion" }),
    );
    sections.insert(
        format!("{}D", class_id),
        json!({ "avgScore": 79, "riskCount": 3, "activeChapter": "Force and Laws of Motion" }),
    );

    json!({
        "schoolName": "Greenwood International School (Demo)",
        "principal": {
            "name": "Dr. Anjali Sharma",
            "email": "demo.principal@ready4exam.com",
            "alerts": [
                {
                    "id": 1,
                    "type": "critical",
                    "msg": format!("Class {}B Math Average dropped below 65%", class_id),
                    "date": "Today"
                },
                {
                    "id": 2,
                    "type": "warning",
                    "msg": format!("3 Students in {}C stuck in 'Remedial Loop'", class_id),
                    "date": "Yesterday"
                },
                {
                    "id": 3,
                    "type": "info",
                    "msg": "Term 1 Prep: 85% participation rate",
                    "date": "2 days ago"
                }
            ]
        },
        "sections": sections,
        "teachers": [
            { "id": "t1", "name": "Mr. Rajesh Kumar", "subject": "Mathematics", "performance": 78 },
            { "id": "t2", "name": "Ms. Priya Singh", "subject": "Science", "performance": 82 },
            { "id": "t3", "name": "Mr. Ahmed Khan", "subject": "Social Science", "performance": 74 },
            { "id": "t4", "name": "Mrs. Linda D'Souza", "subject": "English", "performance": 88 }
        ]
    })
}
