use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    AdminPayFeesCmd, AssignmentPolicy, AssignmentTarget, CreateAssociationCmd, CreateFeeCmd,
    Engine, EngineError, FeeCategory, FeeOutcome, MembershipStatus, MoneyCents, PayFeesCmd,
    PaymentStatus, RegisterMemberCmd, ReviewMembershipCmd, UpdateExpenseCmd, WithdrawCmd,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn register(engine: &Engine, name: &str, phone: &str) -> Uuid {
    engine
        .register_member(RegisterMemberCmd::new(name, phone, "pw"))
        .await
        .unwrap()
        .id
}

async fn association_with_members(engine: &Engine, count: usize) -> (Uuid, Uuid, Vec<Uuid>) {
    let creator = register(engine, "Abebe Kebede", "0911000000").await;
    let association = engine
        .create_association(CreateAssociationCmd::new(
            "Selam Edir",
            creator,
            MoneyCents::new(20_000),
        ))
        .await
        .unwrap();

    let mut members = Vec::with_capacity(count);
    for i in 0..count {
        let member = register(
            engine,
            &format!("Member {}", i + 1),
            &format!("0911{:06}", i + 1),
        )
        .await;
        engine
            .join_association(association.id, member)
            .await
            .unwrap();
        engine
            .review_membership(ReviewMembershipCmd::new(
                association.id,
                member,
                creator,
                MembershipStatus::Active,
            ))
            .await
            .unwrap();
        members.push(member);
    }
    (association.id, creator, members)
}

async fn monthly_dues(engine: &Engine, association_id: Uuid, creator: Uuid) -> FeeOutcome {
    engine
        .create_fee(CreateFeeCmd::new(
            association_id,
            creator,
            "Monthly dues",
            FeeCategory::MonthlyFee,
            MoneyCents::new(20_000),
        ))
        .await
        .unwrap()
}

async fn make_staff(db: &DatabaseConnection, member_id: Uuid) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE members SET is_staff = 1 WHERE id = ?",
        vec![member_id.to_string().into()],
    ))
    .await
    .unwrap();
}

fn assignment_of(outcome: &FeeOutcome, member_id: Uuid) -> Uuid {
    outcome
        .assignments
        .iter()
        .find(|a| a.member_id() == Some(member_id))
        .unwrap()
        .id
}

#[tokio::test]
async fn pay_fees_settles_a_batch_under_one_reference() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 2).await;
    let outcome = monthly_dues(&engine, association_id, creator).await;

    let first = assignment_of(&outcome, members[0]);
    let second = assignment_of(&outcome, members[1]);

    let batch = engine
        .pay_fees(PayFeesCmd::new(members[0], vec![first, second], "telebirr"))
        .await
        .unwrap();
    assert_eq!(batch.succeeded, vec![first, second]);
    assert!(batch.skipped.is_empty());
    let trx_ref = batch.trx_ref.unwrap();
    assert_eq!(trx_ref.len(), 12);

    let detail = engine.fee_detail(outcome.fee.id, creator).await.unwrap();
    for id in [first, second] {
        let row = detail
            .assignments
            .iter()
            .find(|row| row.assignment.id == id)
            .unwrap();
        assert_eq!(row.assignment.payment_status, PaymentStatus::Paid);
        assert_eq!(row.assignment.payment_method.as_deref(), Some("telebirr"));
        assert_eq!(row.assignment.trx_ref.as_deref(), Some(trx_ref.as_str()));
        assert!(row.assignment.paid_at.is_some());
    }
}

#[tokio::test]
async fn pay_fees_skips_rows_not_currently_owed() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 2).await;
    let outcome = engine
        .create_fee(
            CreateFeeCmd::new(
                association_id,
                creator,
                "Monthly dues",
                FeeCategory::MonthlyFee,
                MoneyCents::new(20_000),
            )
            .supported_member(members[0]),
        )
        .await
        .unwrap();

    let open = assignment_of(&outcome, members[1]);
    let for_you = assignment_of(&outcome, members[0]);
    let ghost = Uuid::new_v4();

    engine
        .pay_fees(PayFeesCmd::new(members[1], vec![open], "cash"))
        .await
        .unwrap();

    let batch = engine
        .pay_fees(PayFeesCmd::new(
            creator,
            vec![open, for_you, ghost],
            "cash",
        ))
        .await
        .unwrap();
    assert!(batch.succeeded.is_empty());
    assert_eq!(batch.skipped, vec![open, for_you, ghost]);
}

#[tokio::test]
async fn duplicate_assignment_ids_collapse() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 1).await;
    let outcome = monthly_dues(&engine, association_id, creator).await;
    let id = assignment_of(&outcome, members[0]);

    let batch = engine
        .pay_fees(PayFeesCmd::new(members[0], vec![id, id], "cash"))
        .await
        .unwrap();
    assert_eq!(batch.succeeded, vec![id]);
    assert!(batch.skipped.is_empty());
}

#[tokio::test]
async fn stale_bank_id_degrades_to_none() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 1).await;
    let outcome = monthly_dues(&engine, association_id, creator).await;
    let id = assignment_of(&outcome, members[0]);

    let batch = engine
        .pay_fees(
            PayFeesCmd::new(members[0], vec![id], "bank transfer").bank_id(Uuid::new_v4()),
        )
        .await
        .unwrap();
    assert_eq!(batch.succeeded, vec![id]);

    let detail = engine.fee_detail(outcome.fee.id, creator).await.unwrap();
    let row = detail
        .assignments
        .iter()
        .find(|row| row.assignment.id == id)
        .unwrap();
    assert_eq!(row.assignment.payment_status, PaymentStatus::Paid);
    assert_eq!(row.assignment.bank_id, None);
}

#[tokio::test]
async fn payment_method_must_not_be_blank() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 1).await;
    let outcome = monthly_dues(&engine, association_id, creator).await;
    let id = assignment_of(&outcome, members[0]);

    let err = engine
        .pay_fees(PayFeesCmd::new(members[0], vec![id], "   "))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::MissingField("payment method".to_string()));
}

#[tokio::test]
async fn unpay_fees_restores_open_state() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 1).await;
    let outcome = monthly_dues(&engine, association_id, creator).await;
    let id = assignment_of(&outcome, members[0]);

    engine
        .pay_fees(
            PayFeesCmd::new(members[0], vec![id], "telebirr").proof_image("receipts/march.png"),
        )
        .await
        .unwrap();

    let batch = engine.unpay_fees(&[id], creator).await.unwrap();
    assert_eq!(batch.succeeded, vec![id]);
    assert_eq!(batch.trx_ref, None);

    let detail = engine.fee_detail(outcome.fee.id, creator).await.unwrap();
    let row = detail
        .assignments
        .iter()
        .find(|row| row.assignment.id == id)
        .unwrap();
    assert_eq!(row.assignment.payment_status, PaymentStatus::NotPaid);
    assert_eq!(row.assignment.payment_method, None);
    assert_eq!(row.assignment.trx_ref, None);
    assert_eq!(row.assignment.proof_image, None);
    assert_eq!(row.assignment.paid_at, None);

    let again = engine.unpay_fees(&[id], creator).await.unwrap();
    assert!(again.succeeded.is_empty());
    assert_eq!(again.skipped, vec![id]);
}

#[tokio::test]
async fn unpay_fees_requires_committee() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 1).await;
    let outcome = monthly_dues(&engine, association_id, creator).await;
    let id = assignment_of(&outcome, members[0]);

    engine
        .pay_fees(PayFeesCmd::new(members[0], vec![id], "cash"))
        .await
        .unwrap();

    let err = engine.unpay_fees(&[id], members[0]).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Forbidden("committee role required".to_string())
    );
}

#[tokio::test]
async fn remove_payment_reverts_the_whole_batch() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 2).await;
    let outcome = monthly_dues(&engine, association_id, creator).await;
    let first = assignment_of(&outcome, members[0]);
    let second = assignment_of(&outcome, members[1]);

    let batch = engine
        .pay_fees(PayFeesCmd::new(members[0], vec![first, second], "cash"))
        .await
        .unwrap();
    let trx_ref = batch.trx_ref.unwrap();

    let reverted = engine.remove_payment(&trx_ref, creator).await.unwrap();
    assert_eq!(reverted.succeeded.len(), 2);
    assert_eq!(reverted.trx_ref.as_deref(), Some(trx_ref.as_str()));

    let detail = engine.fee_detail(outcome.fee.id, creator).await.unwrap();
    assert!(
        detail
            .assignments
            .iter()
            .all(|row| row.assignment.payment_status == PaymentStatus::NotPaid)
    );

    let repeated = engine.remove_payment(&trx_ref, creator).await.unwrap();
    assert!(repeated.succeeded.is_empty());
    assert!(repeated.skipped.is_empty());
}

#[tokio::test]
async fn admin_pay_requires_staff() {
    let (engine, db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 1).await;
    let outcome = monthly_dues(&engine, association_id, creator).await;
    let id = assignment_of(&outcome, members[0]);

    let err = engine
        .admin_pay_fees(AdminPayFeesCmd::new(creator, vec![id], "cash"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Forbidden("staff role required".to_string())
    );

    make_staff(&db, creator).await;
    let batch = engine
        .admin_pay_fees(AdminPayFeesCmd::new(creator, vec![id], "cash"))
        .await
        .unwrap();
    assert_eq!(batch.succeeded, vec![id]);

    let detail = engine.fee_detail(outcome.fee.id, creator).await.unwrap();
    let row = detail
        .assignments
        .iter()
        .find(|row| row.assignment.id == id)
        .unwrap();
    assert_eq!(row.assignment.payment_status, PaymentStatus::Paid);
    assert_eq!(row.assignment.payment_method.as_deref(), Some("cash"));
    assert_eq!(row.assignment.bank_id, None);
    assert_eq!(row.assignment.proof_image, None);
}

#[tokio::test]
async fn withdraw_creates_a_settled_expense() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 1).await;

    let outcome = engine
        .withdraw(
            WithdrawCmd::new(
                association_id,
                creator,
                "Funeral support",
                FeeCategory::Other,
                MoneyCents::new(150_000),
                AssignmentTarget::Member {
                    member_id: members[0],
                },
            )
            .method("cheque")
            .reason("burial costs"),
        )
        .await
        .unwrap();

    assert_eq!(outcome.assignments.len(), 1);
    let assignment = &outcome.assignments[0];
    assert_eq!(assignment.payment_status, PaymentStatus::Paid);
    assert_eq!(assignment.member_id(), Some(members[0]));
    assert_eq!(assignment.payment_method.as_deref(), Some("cheque"));
    assert_eq!(assignment.trx_ref.as_deref().map(str::len), Some(12));
    assert!(assignment.paid_at.is_some());
}

#[tokio::test]
async fn withdraw_rejects_unknown_beneficiary() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, _members) = association_with_members(&engine, 1).await;

    let err = engine
        .withdraw(WithdrawCmd::new(
            association_id,
            creator,
            "Funeral support",
            FeeCategory::Other,
            MoneyCents::new(150_000),
            AssignmentTarget::Member {
                member_id: Uuid::new_v4(),
            },
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidTarget("target member not exists".to_string())
    );
}

#[tokio::test]
async fn update_expense_resettles_one_assignment() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 1).await;

    let original = engine
        .withdraw(WithdrawCmd::new(
            association_id,
            creator,
            "Hall rent",
            FeeCategory::Other,
            MoneyCents::new(50_000),
            AssignmentTarget::Association,
        ))
        .await
        .unwrap();
    let original_ref = original.assignments[0].trx_ref.clone().unwrap();

    let updated = engine
        .update_expense(
            UpdateExpenseCmd::new(
                original.fee.id,
                creator,
                AssignmentTarget::Member {
                    member_id: members[0],
                },
            )
            .name("Support payout")
            .amount(MoneyCents::new(80_000)),
        )
        .await
        .unwrap();

    assert_eq!(updated.fee.name, "Support payout");
    assert_eq!(updated.fee.amount, MoneyCents::new(80_000));
    assert_eq!(updated.assignments.len(), 1);
    let assignment = &updated.assignments[0];
    assert_eq!(assignment.payment_status, PaymentStatus::Paid);
    assert_eq!(assignment.member_id(), Some(members[0]));
    assert_ne!(assignment.trx_ref.as_deref(), Some(original_ref.as_str()));

    let detail = engine.fee_detail(original.fee.id, creator).await.unwrap();
    assert_eq!(detail.assignments.len(), 1);
}

#[tokio::test]
async fn update_expense_rejects_deposit_fees() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, _members) = association_with_members(&engine, 1).await;
    let outcome = monthly_dues(&engine, association_id, creator).await;

    let err = engine
        .update_expense(UpdateExpenseCmd::new(
            outcome.fee.id,
            creator,
            AssignmentTarget::Association,
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidStatus("not a withdrawal fee".to_string())
    );
}

#[tokio::test]
async fn custom_list_policy_still_pays_normally() {
    let (engine, _db) = engine_with_db().await;
    let (association_id, creator, members) = association_with_members(&engine, 2).await;

    let outcome = engine
        .create_fee(
            CreateFeeCmd::new(
                association_id,
                creator,
                "Roof repair",
                FeeCategory::Other,
                MoneyCents::new(100_000),
            )
            .policy(AssignmentPolicy::CustomMemberList(vec![
                members[0], members[1],
            ])),
        )
        .await
        .unwrap();

    let ids: Vec<Uuid> = outcome.assignments.iter().map(|a| a.id).collect();
    let batch = engine
        .pay_fees(PayFeesCmd::new(creator, ids.clone(), "cash"))
        .await
        .unwrap();
    assert_eq!(batch.succeeded, ids);
}
