//! End-to-end scenarios across the command layer: orchestration, the
//! compliance gate, posting, export, open-item matching and UStVA.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use aioffice_agents::{
    OrchestrateRequest, OrchestrateResponse, OrchestrationClient, SuggestionDto,
};
use aioffice_cases::{Case, CaseState, MatchKind, PolicySet};
use aioffice_core::{
    Actor, CompanyId, JournalId, OfficeError, OfficeResult, PartnerId, Period, Role,
};
use aioffice_export::{render_ustva, ExportFormat};
use aioffice_ledger::{
    Account, AccountKind, ChartOfAccounts, Journal, JournalKind, LedgerBook, LedgerEntry,
    LedgerLine,
};
use aioffice_tax::aggregate_ustva;

use crate::{
    apply_reconciliation, approve_case, export_batch, export_case, flag_needs_attention,
    post_case, propose_case, reset_to_new, run_opos, run_orchestrator, BatchKind, LocalMatcher,
};

fn approver() -> Actor {
    Actor::user("lead", Role::Approver)
}

fn clerk() -> Actor {
    Actor::user("clerk", Role::User)
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 20).unwrap()
}

fn january() -> Period {
    "2024-01".parse().unwrap()
}

fn enrichment_dto(field: &str, value: &str) -> SuggestionDto {
    SuggestionDto {
        suggestion_type: "enrichment".into(),
        payload: serde_json::json!({ "field": field, "value": value }),
        confidence: 0.9,
        risk_score: 0.0,
        explanation: String::new(),
        requires_human: true,
        agent_name: "enrichment_agent".into(),
    }
}

fn accounting_dto(confidence: f64, risk_score: f64) -> SuggestionDto {
    SuggestionDto {
        suggestion_type: "accounting_entry".into(),
        payload: serde_json::json!({
            "lines": [
                {"account": "6300", "debit": 100.0, "credit": 0.0, "description": "Aufwand"},
                {"account": "1576", "debit": 19.0, "credit": 0.0, "description": "Vorsteuer 19%"},
                {"account": "1600", "debit": 0.0, "credit": 119.0, "description": "Verbindlichkeiten"}
            ],
            "tax_rate": 0.19
        }),
        confidence,
        risk_score,
        explanation: "Standardkontierung".into(),
        requires_human: true,
        agent_name: "kontierung_agent".into(),
    }
}

fn reduced_rate_dto() -> SuggestionDto {
    SuggestionDto {
        suggestion_type: "accounting_entry".into(),
        payload: serde_json::json!({
            "lines": [
                {"account": "6310", "debit": 100.0, "credit": 0.0, "description": "Miete"},
                {"account": "1571", "debit": 7.0, "credit": 0.0, "description": "Vorsteuer 7%"},
                {"account": "1600", "debit": 0.0, "credit": 107.0, "description": "Verbindlichkeiten"}
            ],
            "tax_rate": 0.07
        }),
        confidence: 0.9,
        risk_score: 0.05,
        explanation: String::new(),
        requires_human: true,
        agent_name: "kontierung_agent".into(),
    }
}

/// Plays back a fixed list of suggestions, regardless of the request.
struct ScriptedOrchestrator {
    suggestions: Vec<SuggestionDto>,
}

impl ScriptedOrchestrator {
    fn new(suggestions: Vec<SuggestionDto>) -> Self {
        Self { suggestions }
    }

    fn standard() -> Self {
        Self::new(vec![
            enrichment_dto("invoice_date", "2024-01-15"),
            enrichment_dto("invoice_number", "4711"),
            accounting_dto(0.92, 0.08),
        ])
    }
}

impl OrchestrationClient for ScriptedOrchestrator {
    fn orchestrate(&self, request: &OrchestrateRequest) -> OfficeResult<OrchestrateResponse> {
        Ok(OrchestrateResponse {
            case_id: request.case_id,
            request_id: request.request_id.clone(),
            suggestions: self.suggestions.clone(),
            status: "ok".to_string(),
        })
    }
}

struct FailingService;

impl OrchestrationClient for FailingService {
    fn orchestrate(&self, _request: &OrchestrateRequest) -> OfficeResult<OrchestrateResponse> {
        Err(OfficeError::external("ai_office_service", "request timed out"))
    }
}

/// One company with a small SKR03 chart, a purchase journal and an empty
/// ledger book.
struct World {
    company: CompanyId,
    partner: PartnerId,
    chart: ChartOfAccounts,
    journals: Vec<Journal>,
    book: LedgerBook,
    policies: PolicySet,
}

impl World {
    fn new() -> Self {
        aioffice_observability::init();
        let company = CompanyId::new();
        let mut chart = ChartOfAccounts::new();
        for (code, name, kind) in [
            ("6300", "Sonstige betriebliche Aufwendungen", AccountKind::Expense),
            ("6310", "Miete", AccountKind::Expense),
            ("1576", "Abziehbare Vorsteuer 19%", AccountKind::Asset),
            ("1571", "Abziehbare Vorsteuer 7%", AccountKind::Asset),
            ("1600", "Verbindlichkeiten aus L.u.L.", AccountKind::Liability),
            ("1200", "Bank", AccountKind::Asset),
        ] {
            chart.add(
                company,
                Account {
                    code: code.into(),
                    name: name.into(),
                    kind,
                },
            );
        }
        let journals = vec![Journal {
            id: JournalId::new(),
            company,
            name: "Einkauf".into(),
            code: "EK".into(),
            kind: JournalKind::Purchase,
        }];
        Self {
            company,
            partner: PartnerId::new(),
            chart,
            journals,
            book: LedgerBook::new(),
            policies: PolicySet::new(),
        }
    }

    fn case(&self, reference: &str) -> Case {
        let mut case = Case::new(reference, self.company, january());
        case.set_partner(self.partner);
        case
    }

    /// Drive a case through orchestrate, approve and post with the standard
    /// three-line 19% suggestion.
    fn posted_case(&mut self, reference: &str) -> Case {
        let mut case = self.case(reference);
        let service = ScriptedOrchestrator::standard();
        run_orchestrator(&mut case, &service, &approver(), format!("req-{reference}")).unwrap();
        approve_case(&mut case, &self.policies, &approver(), today()).unwrap();
        post_case(
            &mut case,
            &self.chart,
            &self.journals,
            &mut self.book,
            &approver(),
            today(),
        )
        .unwrap();
        case
    }
}

#[test]
fn full_lifecycle_produces_audit_trail_and_datev_file() {
    let mut world = World::new();
    let mut case = world.case("RE-2024-0042");

    let added = run_orchestrator(
        &mut case,
        &ScriptedOrchestrator::standard(),
        &approver(),
        "req-1",
    )
    .unwrap();
    assert_eq!(added, 3);
    assert_eq!(case.state(), CaseState::Proposed);
    let orchestrated = case.audit_trail().find("orchestrate").next().unwrap();
    assert_eq!(orchestrated.after.as_ref().unwrap()["suggestions_added"], 3);
    assert_eq!(orchestrated.after.as_ref().unwrap()["request_id"], "req-1");

    approve_case(&mut case, &world.policies, &approver(), today()).unwrap();
    assert_eq!(case.state(), CaseState::Approved);

    post_case(
        &mut case,
        &world.chart,
        &world.journals,
        &mut world.book,
        &approver(),
        today(),
    )
    .unwrap();
    assert_eq!(case.state(), CaseState::Posted);
    let entry = world.book.entry(case.ledger_entry().unwrap()).unwrap();
    // The extracted invoice date wins over the posting day.
    assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    assert_eq!(entry.total_debit(), dec!(119.0));
    assert_eq!(entry.total_credit(), dec!(119.0));

    let file = export_case(&mut case, &approver()).unwrap();
    assert_eq!(case.state(), CaseState::Exported);
    assert_eq!(file.filename, "DATEV_RE-2024-0042.csv");
    assert_eq!(case.export_filename(), Some("DATEV_RE-2024-0042.csv"));
    assert!(file.content.contains("119,00"));
    assert!(file.content.contains("4711"));

    let actions: Vec<&str> = case.audit_entries().iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, ["orchestrate", "approve", "post", "export"]);

    // A second export has no edge to walk.
    let err = export_case(&mut case, &approver()).unwrap_err();
    assert!(matches!(err, OfficeError::InvalidTransition { .. }));
}

#[test]
fn orchestrator_failure_leaves_the_case_untouched() {
    let world = World::new();
    let mut case = world.case("RE-2024-0050");

    let err = run_orchestrator(&mut case, &FailingService, &approver(), "req-2").unwrap_err();
    assert!(matches!(err, OfficeError::ExternalService { .. }));
    assert!(err.is_recoverable());
    assert_eq!(case.state(), CaseState::New);
    assert_eq!(case.suggestion_count(), 0);
    assert!(case.audit_entries().is_empty());
}

#[test]
fn malformed_agent_payload_aborts_before_any_suggestion_lands() {
    let world = World::new();
    let mut case = world.case("RE-2024-0051");

    let service = ScriptedOrchestrator::new(vec![
        accounting_dto(0.9, 0.1),
        SuggestionDto {
            suggestion_type: "telepathy".into(),
            payload: serde_json::json!({}),
            confidence: 0.5,
            risk_score: 0.5,
            explanation: String::new(),
            requires_human: true,
            agent_name: "mystery_agent".into(),
        },
    ]);
    let err = run_orchestrator(&mut case, &service, &approver(), "req-3").unwrap_err();
    assert!(matches!(err, OfficeError::Serialization(_)));
    // The valid suggestion in the same response must not land either.
    assert_eq!(case.suggestion_count(), 0);
    assert_eq!(case.state(), CaseState::New);
}

#[test]
fn low_confidence_blocks_approval_until_the_case_is_reset() {
    let mut world = World::new();
    let mut case = world.case("RE-2024-0060");

    let service = ScriptedOrchestrator::new(vec![
        enrichment_dto("invoice_date", "2024-01-12"),
        accounting_dto(0.5, 0.1),
    ]);
    run_orchestrator(&mut case, &service, &approver(), "req-4").unwrap();

    let err = approve_case(&mut case, &world.policies, &approver(), today()).unwrap_err();
    assert!(matches!(err, OfficeError::Validation(_)));
    assert!(err.to_string().contains("below policy threshold"));
    assert_eq!(case.state(), CaseState::Proposed);

    flag_needs_attention(&mut case, &approver(), Some("Kontierung unplausibel".into())).unwrap();
    assert_eq!(case.state(), CaseState::NeedsAttention);
    let flagged = case.audit_trail().find("needs_attention").next().unwrap();
    assert_eq!(flagged.after.as_ref().unwrap()["note"], "Kontierung unplausibel");

    reset_to_new(&mut case, &approver()).unwrap();
    assert_eq!(case.state(), CaseState::New);

    // A better suggestion passes the gate on the second run.
    run_orchestrator(
        &mut case,
        &ScriptedOrchestrator::standard(),
        &approver(),
        "req-5",
    )
    .unwrap();
    approve_case(&mut case, &world.policies, &approver(), today()).unwrap();
    assert_eq!(case.state(), CaseState::Approved);
    post_case(
        &mut case,
        &world.chart,
        &world.journals,
        &mut world.book,
        &approver(),
        today(),
    )
    .unwrap();
    assert_eq!(case.state(), CaseState::Posted);
}

#[test]
fn non_approvers_are_rejected_at_every_gate() {
    let mut world = World::new();
    let mut case = world.case("RE-2024-0070");
    run_orchestrator(
        &mut case,
        &ScriptedOrchestrator::standard(),
        &clerk(),
        "req-6",
    )
    .unwrap();

    let err = approve_case(&mut case, &world.policies, &clerk(), today()).unwrap_err();
    assert!(matches!(err, OfficeError::Permission(_)));
    assert_eq!(case.state(), CaseState::Proposed);

    approve_case(&mut case, &world.policies, &approver(), today()).unwrap();
    let err = post_case(
        &mut case,
        &world.chart,
        &world.journals,
        &mut world.book,
        &clerk(),
        today(),
    )
    .unwrap_err();
    assert!(matches!(err, OfficeError::Permission(_)));
    assert_eq!(case.state(), CaseState::Approved);

    post_case(
        &mut case,
        &world.chart,
        &world.journals,
        &mut world.book,
        &approver(),
        today(),
    )
    .unwrap();
    assert!(matches!(
        export_case(&mut case, &clerk()).unwrap_err(),
        OfficeError::Permission(_)
    ));
    assert!(matches!(
        apply_reconciliation(&mut case, &mut world.book, &clerk()).unwrap_err(),
        OfficeError::Permission(_)
    ));

    let mut cases = vec![case];
    let period = january();
    assert!(matches!(
        export_batch(
            &mut cases,
            &world.book,
            &clerk(),
            &period,
            &period,
            false,
            BatchKind::Datev,
        )
        .unwrap_err(),
        OfficeError::Permission(_)
    ));
    assert_eq!(cases[0].state(), CaseState::Posted);
}

#[test]
fn opos_matching_and_reconciliation_settle_the_payment() {
    let mut world = World::new();
    let mut case = world.posted_case("RE-2024-0042");

    // Bank payment carrying the invoice reference.
    let payment = LedgerEntry::new(
        world.journals[0].id,
        NaiveDate::from_ymd_opt(2024, 1, 18).unwrap(),
        "RE-2024-0042",
        Some(world.partner),
        vec![
            LedgerLine::new("1600", dec!(119.0), Decimal::ZERO, "Zahlung", Some(world.partner)),
            LedgerLine::new("1200", Decimal::ZERO, dec!(119.0), "Bank", None),
        ],
    )
    .unwrap();
    world.book.insert(payment);

    let added = run_opos(&mut case, &world.book, &LocalMatcher, &approver(), "req-7").unwrap();
    assert_eq!(added, 1);
    assert_eq!(case.state(), CaseState::Posted);

    let suggestion = case.latest_reconciliation().unwrap();
    assert_eq!(suggestion.agent_name, "opos_agent");
    assert_eq!(suggestion.confidence, 0.95);
    assert!(suggestion.explanation.starts_with("Found 1 match(es)."));
    let proposal = suggestion.as_reconciliation().unwrap();
    assert_eq!(proposal.matches.len(), 1);
    assert_eq!(proposal.matches[0].match_type, MatchKind::Combined);
    assert_eq!(proposal.matches[0].amount, dec!(119.0));
    // Expense and Vorsteuer lines stay unmatched.
    assert_eq!(proposal.unmatched_debit.len(), 2);
    assert!(proposal.unmatched_credit.is_empty());
    assert_eq!(case.audit_trail().find("opos_match").count(), 1);

    let outcome = apply_reconciliation(&mut case, &mut world.book, &approver()).unwrap();
    assert_eq!(outcome.applied_count, 1);
    assert!(outcome.errors.is_empty());
    assert_eq!(world.book.open_items(world.partner).len(), 2);
    assert_eq!(case.audit_trail().find("reconciliation_applied").count(), 1);

    // Reapplying the same proposal settles nothing new.
    let again = apply_reconciliation(&mut case, &mut world.book, &approver()).unwrap();
    assert_eq!(again.applied_count, 0);
}

#[test]
fn opos_requires_a_partner_with_open_items() {
    let mut world = World::new();
    let mut case = world.posted_case("RE-2024-0080");

    // Foreign partner, so nothing is open for it.
    let mut stranger = world.case("RE-2024-0081");
    stranger.set_partner(PartnerId::new());
    let err = run_opos(&mut stranger, &world.book, &LocalMatcher, &approver(), "req-8")
        .unwrap_err();
    assert!(matches!(err, OfficeError::InvalidTransition { .. }));

    // Settle every line, then matching has nothing to work with.
    for item in world.book.open_items(world.partner) {
        if let Some(line) = world.book.line_mut(item.id) {
            line.reconciled = true;
        }
    }
    let err = run_opos(&mut case, &world.book, &LocalMatcher, &approver(), "req-9").unwrap_err();
    assert!(matches!(err, OfficeError::NotFound { .. }));
    assert_eq!(case.suggestion_count(), 3);
}

#[test]
fn batch_export_transitions_only_posted_cases() {
    let mut world = World::new();
    let case_a = world.posted_case("RE-2024-0100");
    let case_b = world.posted_case("RE-2024-0101");
    let mut case_c = world.posted_case("RE-2024-0102");
    export_case(&mut case_c, &approver()).unwrap();

    let mut cases = vec![case_a, case_b, case_c];
    let period = january();
    let outcome = export_batch(
        &mut cases,
        &world.book,
        &approver(),
        &period,
        &period,
        false,
        BatchKind::Datev,
    )
    .unwrap();
    assert_eq!(outcome.case_count, 2);
    assert_eq!(outcome.file.filename, "DATEV_export_2024-01_2024-01.csv");
    assert!(cases.iter().all(|c| c.state() == CaseState::Exported));
    assert_eq!(
        cases[0].export_filename(),
        Some("DATEV_export_2024-01_2024-01.csv")
    );
    // The individually exported case keeps its own filename.
    assert_eq!(cases[2].export_filename(), Some("DATEV_RE-2024-0102.csv"));

    let everything = export_batch(
        &mut cases,
        &world.book,
        &approver(),
        &period,
        &period,
        true,
        BatchKind::Summary,
    )
    .unwrap();
    assert_eq!(everything.case_count, 3);
    assert_eq!(everything.file.filename, "export_2024-01_2024-01.csv");
    assert!(everything.file.content.contains("RE-2024-0100"));
}

#[test]
fn ustva_aggregates_the_period_across_cases() {
    let mut world = World::new();
    let standard = world.posted_case("RE-2024-0200");

    let mut reduced = world.case("RE-2024-0201");
    let service = ScriptedOrchestrator::new(vec![
        enrichment_dto("invoice_date", "2024-01-10"),
        reduced_rate_dto(),
    ]);
    run_orchestrator(&mut reduced, &service, &approver(), "req-10").unwrap();
    approve_case(&mut reduced, &world.policies, &approver(), today()).unwrap();
    post_case(
        &mut reduced,
        &world.chart,
        &world.journals,
        &mut world.book,
        &approver(),
        today(),
    )
    .unwrap();

    let figures = aggregate_ustva([&standard, &reduced], &january()).unwrap();
    assert_eq!(figures.kz81, dec!(100.00));
    assert_eq!(figures.kz66, dec!(19.00));
    assert_eq!(figures.kz86, dec!(100.00));
    assert_eq!(figures.kz61, dec!(7.00));
    assert_eq!(figures.kz81_tax, dec!(19.00));
    assert_eq!(figures.kz86_tax, dec!(7.00));
    // Input VAT fully offsets the output tax here.
    assert_eq!(figures.kz83, dec!(0.00));

    let file = render_ustva(&figures, ExportFormat::Csv).unwrap();
    assert_eq!(file.filename, "ustva_2024-01.csv");
    assert!(file.content.contains("81;Steuerpflichtige Umsaetze 19%;100.00"));
    assert!(file.content.contains("83;Vorauszahlung;0.00"));
}

#[test]
fn audit_purge_requires_privilege() {
    let world = World::new();
    let mut case = world.case("RE-2024-0300");
    propose_case(&mut case, &clerk()).unwrap();
    assert_eq!(case.state(), CaseState::Proposed);

    let entry_id = case.audit_entries()[0].id;
    let err = case.purge_audit(entry_id, false).unwrap_err();
    assert!(matches!(err, OfficeError::Permission(_)));
    assert_eq!(case.audit_entries().len(), 1);

    case.purge_audit(entry_id, true).unwrap();
    assert!(case.audit_entries().is_empty());
}
