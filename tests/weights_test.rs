//! Weight validation and redistribution integration tests

use appraise::storage::test_utils::{
    base_kra_fixture, create_test_store, job_kra_fixture, responsibility_fixture,
};
use appraise::{AppraisalEngine, AppraisalError, AssessmentMode, CompanyId, JobId};

#[tokio::test]
async fn test_validate_fully_valid_job() {
    let store = create_test_store().await.expect("test store");
    let engine = AppraisalEngine::new(store.clone());

    let company_id = CompanyId::new();
    let job_id = JobId::new();

    let sales = responsibility_fixture(
        company_id,
        job_id,
        "Sales Targets",
        70,
        AssessmentMode::KraBased,
        0,
    );
    let leadership = responsibility_fixture(
        company_id,
        job_id,
        "Team Leadership",
        30,
        AssessmentMode::ResponsibilityOnly,
        1,
    );
    store.insert_responsibility(&sales).await.expect("insert");
    store
        .insert_responsibility(&leadership)
        .await
        .expect("insert");

    for (name, weight) in [("Monthly Revenue", 60), ("Pipeline Coverage", 40)] {
        let kra = job_kra_fixture(company_id, job_id, sales.id, None, Some(name), weight);
        store.insert_job_kra(&kra).await.expect("insert kra");
    }

    let report = engine
        .validate_weights(company_id, job_id)
        .await
        .expect("validate");

    assert_eq!(report.responsibility_weight_total, 100);
    assert!(report.is_responsibility_weight_valid);
    assert!(report.is_fully_valid);

    let sales_check = report
        .per_responsibility
        .iter()
        .find(|c| c.responsibility_id == sales.id)
        .expect("sales check");
    assert!(sales_check.needs_kras);
    assert_eq!(sales_check.kra_weight_total, 100);
    assert!(sales_check.is_valid);

    let leadership_check = report
        .per_responsibility
        .iter()
        .find(|c| c.responsibility_id == leadership.id)
        .expect("leadership check");
    assert!(!leadership_check.needs_kras);
    assert!(leadership_check.is_valid);
}

#[tokio::test]
async fn test_invalid_kra_total_flagged() {
    let store = create_test_store().await.expect("test store");
    let engine = AppraisalEngine::new(store.clone());

    let company_id = CompanyId::new();
    let job_id = JobId::new();

    let responsibility = responsibility_fixture(
        company_id,
        job_id,
        "Sales Targets",
        100,
        AssessmentMode::KraBased,
        0,
    );
    store
        .insert_responsibility(&responsibility)
        .await
        .expect("insert");

    for (name, weight) in [("Monthly Revenue", 50), ("Pipeline Coverage", 30)] {
        let kra = job_kra_fixture(company_id, job_id, responsibility.id, None, Some(name), weight);
        store.insert_job_kra(&kra).await.expect("insert kra");
    }

    let report = engine
        .validate_weights(company_id, job_id)
        .await
        .expect("validate");

    assert!(report.is_responsibility_weight_valid);
    assert!(!report.is_fully_valid);

    let check = &report.per_responsibility[0];
    assert!(check.needs_kras);
    assert_eq!(check.kra_weight_total, 80);
    assert!(!check.is_valid);
}

#[tokio::test]
async fn test_responsibility_without_kras_exempt() {
    let store = create_test_store().await.expect("test store");
    let engine = AppraisalEngine::new(store.clone());

    let company_id = CompanyId::new();
    let job_id = JobId::new();

    // KRA-based but no KRAs exist anywhere: exempt from the KRA check,
    // but the responsibility weight total still fails.
    let responsibility = responsibility_fixture(
        company_id,
        job_id,
        "Sales Targets",
        80,
        AssessmentMode::KraBased,
        0,
    );
    store
        .insert_responsibility(&responsibility)
        .await
        .expect("insert");

    let report = engine
        .validate_weights(company_id, job_id)
        .await
        .expect("validate");

    let check = &report.per_responsibility[0];
    assert!(!check.needs_kras);
    assert!(check.is_valid);
    assert_eq!(report.responsibility_weight_total, 80);
    assert!(!report.is_responsibility_weight_valid);
    assert!(!report.is_fully_valid);
}

#[tokio::test]
async fn test_distribute_responsibility_weights() {
    let store = create_test_store().await.expect("test store");
    let engine = AppraisalEngine::new(store.clone());

    let company_id = CompanyId::new();
    let job_id = JobId::new();

    for (i, name) in ["Sales", "Operations", "Leadership"].into_iter().enumerate() {
        let responsibility = responsibility_fixture(
            company_id,
            job_id,
            name,
            0,
            AssessmentMode::ResponsibilityOnly,
            i as u32,
        );
        store
            .insert_responsibility(&responsibility)
            .await
            .expect("insert");
    }

    let assignments = engine
        .distribute_responsibility_weights(company_id, job_id)
        .await
        .expect("distribute");

    let weights: Vec<u32> = assignments.iter().map(|(_, w)| *w).collect();
    assert_eq!(weights, vec![34, 33, 33]);

    let report = engine
        .validate_weights(company_id, job_id)
        .await
        .expect("validate");
    assert_eq!(report.responsibility_weight_total, 100);
    assert!(report.is_responsibility_weight_valid);
}

#[tokio::test]
async fn test_distribute_job_kra_weights() {
    let store = create_test_store().await.expect("test store");
    let engine = AppraisalEngine::new(store.clone());

    let company_id = CompanyId::new();
    let job_id = JobId::new();

    let responsibility = responsibility_fixture(
        company_id,
        job_id,
        "Sales Targets",
        100,
        AssessmentMode::KraBased,
        0,
    );
    store
        .insert_responsibility(&responsibility)
        .await
        .expect("insert");

    for name in ["Revenue", "Pipeline", "Win Rate"] {
        let kra = job_kra_fixture(company_id, job_id, responsibility.id, None, Some(name), 0);
        store.insert_job_kra(&kra).await.expect("insert kra");
    }

    let assignments = engine
        .distribute_kra_weights(company_id, job_id, responsibility.id)
        .await
        .expect("distribute");

    let total: u32 = assignments.iter().map(|(_, w)| *w).sum();
    assert_eq!(assignments.len(), 3);
    assert_eq!(total, 100);

    let report = engine
        .validate_weights(company_id, job_id)
        .await
        .expect("validate");
    assert!(report.is_fully_valid);
}

#[tokio::test]
async fn test_distribute_base_kra_weights_when_no_job_kras() {
    let store = create_test_store().await.expect("test store");
    let engine = AppraisalEngine::new(store.clone());

    let company_id = CompanyId::new();
    let job_id = JobId::new();

    let responsibility = responsibility_fixture(
        company_id,
        job_id,
        "Store Operations",
        100,
        AssessmentMode::KraBased,
        0,
    );
    store
        .insert_responsibility(&responsibility)
        .await
        .expect("insert");

    for (i, name) in ["Shrinkage", "Stock Accuracy"].into_iter().enumerate() {
        let kra = base_kra_fixture(company_id, responsibility.id, name, 0, i as u32);
        store.insert_base_kra(&kra).await.expect("insert kra");
    }

    let assignments = engine
        .distribute_kra_weights(company_id, job_id, responsibility.id)
        .await
        .expect("distribute");

    let weights: Vec<u32> = assignments.iter().map(|(_, w)| *w).collect();
    assert_eq!(weights, vec![50, 50]);
}

#[tokio::test]
async fn test_distribute_over_zero_kras_rejected() {
    let store = create_test_store().await.expect("test store");
    let engine = AppraisalEngine::new(store.clone());

    let company_id = CompanyId::new();
    let job_id = JobId::new();

    let responsibility = responsibility_fixture(
        company_id,
        job_id,
        "Sales Targets",
        100,
        AssessmentMode::KraBased,
        0,
    );
    store
        .insert_responsibility(&responsibility)
        .await
        .expect("insert");

    let err = engine
        .distribute_kra_weights(company_id, job_id, responsibility.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppraisalError::Validation(_)));
}
