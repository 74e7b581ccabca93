mod common;

use common::{verdict, ScriptedService};
use sqmap::resolve::{Resolver, ServiceError, VerificationResolver};
use sqmap::types::{CandidateKind, CandidateMatch, CandidateMetadata, LegacyItem};

fn candidates() -> Vec<CandidateMatch> {
    [("customers", "full_name"), ("customers", "email_address")]
        .iter()
        .enumerate()
        .map(|(i, (table, column))| CandidateMatch {
            content: format!("column {} in table {} - type TEXT", column, table),
            metadata: CandidateMetadata {
                kind: CandidateKind::Column,
                table_name: table.to_string(),
                column_name: Some(column.to_string()),
                data_type: Some("TEXT".to_string()),
            },
            score: 0.1 * (i + 1) as f32,
        })
        .collect()
}

fn item() -> LegacyItem {
    LegacyItem::new("tb_cli_reg", "c_nom")
}

#[test]
fn valid_reply_becomes_a_mapping() {
    let resolver = VerificationResolver::new(
        ScriptedService::new().reply("tb_cli_reg.c_nom", &verdict("customers.full_name", 0.92)),
    );
    let mapping = resolver.resolve(&item(), &candidates()).unwrap();
    assert_eq!(mapping.legacy_qualified(), "tb_cli_reg.c_nom");
    assert_eq!(mapping.modern_qualified(), "customers.full_name");
    assert_eq!(mapping.transformation_logic, "Direct mapping");
    assert_eq!(mapping.reasoning, "scripted");
}

#[test]
fn bad_replies_are_undecidable_not_fatal() {
    let replies = [
        "Sure! The best match is customers.full_name.",
        r#"{"confidence": 0.9, "transformation_logic": "", "reasoning": ""}"#,
        r#"{"best_match": "full_name", "confidence": 0.9, "transformation_logic": "", "reasoning": ""}"#,
        r#"{"best_match": ".full_name", "confidence": 0.9, "transformation_logic": "", "reasoning": ""}"#,
        r#"{"best_match": "customers.full_name", "confidence": -0.1, "transformation_logic": "", "reasoning": ""}"#,
        "",
    ];
    for raw in replies {
        let resolver =
            VerificationResolver::new(ScriptedService::new().reply("tb_cli_reg.c_nom", raw));
        assert!(resolver.resolve(&item(), &candidates()).is_none(), "accepted: {}", raw);

        let err = resolver.verify(&item(), &candidates()).unwrap_err();
        assert!(matches!(err, ServiceError::MalformedResponse(_)));
    }
}

#[test]
fn service_failures_are_undecidable_not_fatal() {
    let failures = [
        ServiceError::Transient("timed out".to_string()),
        ServiceError::Rejected {
            status: 401,
            message: "bad key".to_string(),
        },
    ];
    for failure in failures {
        let resolver = VerificationResolver::new(
            ScriptedService::new().fail("tb_cli_reg.c_nom", failure.clone()),
        );
        assert!(resolver.resolve(&item(), &candidates()).is_none());
        assert_eq!(resolver.verify(&item(), &candidates()).unwrap_err(), failure);
    }
}

#[test]
fn no_candidates_means_no_service_call() {
    let resolver = VerificationResolver::new(
        ScriptedService::new().reply("tb_cli_reg.c_nom", &verdict("customers.full_name", 0.92)),
    );
    assert!(resolver.resolve(&item(), &[]).is_none());
    assert_eq!(resolver.service().calls(), 0);
}

#[test]
fn context_note_reaches_the_prompt() {
    let resolver = VerificationResolver::new(ScriptedService::new())
        .with_context("Brazilian retail ERP, 1998");
    let _ = resolver.resolve(&item(), &candidates());
    let prompts = resolver.service().prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Context: Brazilian retail ERP, 1998"));
    assert!(prompts[0].contains("- customers.full_name (TEXT) - score: 0.100"));
}
