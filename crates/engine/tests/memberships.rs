use sea_orm::{Database, DatabaseConnection};

use engine::{
    AuditAction, AuditSubject, CreateAssociationCmd, Engine, EngineError, MembershipStatus,
    MoneyCents, RegisterMemberCmd, ReviewMembershipCmd,
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

#[tokio::test]
async fn register_normalizes_phone_and_rejects_duplicates() {
    let (engine, _db) = engine_with_db().await;

    let member = engine
        .register_member(RegisterMemberCmd::new("Abebe Kebede", "0911 12-34-56", "pw"))
        .await
        .unwrap();
    assert_eq!(member.phone, "0911123456");
    assert!(!member.is_staff);

    let err = engine
        .register_member(RegisterMemberCmd::new("Hirut Bekele", "0911123456", "pw"))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("0911123456".to_string()));
}

#[tokio::test]
async fn register_rejects_non_digit_phone() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .register_member(RegisterMemberCmd::new("Abebe Kebede", "09x1", "pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidPhone(_)));
}

#[tokio::test]
async fn register_rejects_empty_password() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .register_member(RegisterMemberCmd::new("Abebe Kebede", "0911123456", ""))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::MissingField("password".to_string()));
}

#[tokio::test]
async fn authenticate_checks_password() {
    let (engine, _db) = engine_with_db().await;
    register(&engine, "Abebe Kebede", "0911123456").await;

    let member = engine.authenticate("0911123456", "pw").await.unwrap();
    assert_eq!(member.full_name, "Abebe Kebede");

    let err = engine.authenticate("0911123456", "wrong").await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Forbidden("invalid credentials".to_string())
    );
    let err = engine.authenticate("0999999999", "pw").await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Forbidden("invalid credentials".to_string())
    );
}

#[tokio::test]
async fn create_association_seeds_founder_committee() {
    let (engine, _db) = engine_with_db().await;
    let creator = register(&engine, "Abebe Kebede", "0911000001").await;

    let association = engine
        .create_association(
            CreateAssociationCmd::new("Selam Edir", creator, MoneyCents::new(20_000))
                .city("Addis Ababa"),
        )
        .await
        .unwrap();

    let detail = engine
        .association_detail(association.id, creator)
        .await
        .unwrap();
    assert_eq!(detail.member_count, 1);
    assert_eq!(detail.unpaid_total, MoneyCents::ZERO);
    assert_eq!(detail.committee.len(), 1);
    assert_eq!(detail.committee[0].id, creator);

    let listed = engine.list_associations().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Selam Edir");
}

#[tokio::test]
async fn association_names_are_unique_case_insensitive() {
    let (engine, _db) = engine_with_db().await;
    let creator = register(&engine, "Abebe Kebede", "0911000001").await;

    engine
        .create_association(CreateAssociationCmd::new(
            "Selam Edir",
            creator,
            MoneyCents::new(20_000),
        ))
        .await
        .unwrap();

    let err = engine
        .create_association(CreateAssociationCmd::new(
            "selam edir",
            creator,
            MoneyCents::new(5_000),
        ))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("selam edir".to_string()));
}

#[tokio::test]
async fn join_and_review_lifecycle() {
    let (engine, _db) = engine_with_db().await;
    let creator = register(&engine, "Abebe Kebede", "0911000001").await;
    let member = register(&engine, "Hirut Bekele", "0911000002").await;
    let association = engine
        .create_association(CreateAssociationCmd::new(
            "Selam Edir",
            creator,
            MoneyCents::new(20_000),
        ))
        .await
        .unwrap();

    let membership = engine
        .join_association(association.id, member)
        .await
        .unwrap();
    assert_eq!(membership.status, MembershipStatus::Pending);
    assert_eq!(membership.maker, member);
    assert!(membership.checker.is_none());
    assert!(!membership.is_committee);

    let pending = engine
        .roster(association.id, Some(MembershipStatus::Pending), creator)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].member.id, member);

    let reviewed = engine
        .review_membership(ReviewMembershipCmd::new(
            association.id,
            member,
            creator,
            MembershipStatus::Active,
        ))
        .await
        .unwrap();
    assert_eq!(reviewed.status, MembershipStatus::Active);
    assert_eq!(reviewed.checker, Some(creator));

    let active = engine.roster(association.id, None, member).await.unwrap();
    assert_eq!(active.len(), 2);
}

#[tokio::test]
async fn second_join_request_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let creator = register(&engine, "Abebe Kebede", "0911000001").await;
    let member = register(&engine, "Hirut Bekele", "0911000002").await;
    let association = engine
        .create_association(CreateAssociationCmd::new(
            "Selam Edir",
            creator,
            MoneyCents::new(20_000),
        ))
        .await
        .unwrap();

    engine
        .join_association(association.id, member)
        .await
        .unwrap();
    let err = engine
        .join_association(association.id, member)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("membership".to_string()));
}

#[tokio::test]
async fn rejected_member_can_rejoin_as_pending() {
    let (engine, _db) = engine_with_db().await;
    let creator = register(&engine, "Abebe Kebede", "0911000001").await;
    let member = register(&engine, "Hirut Bekele", "0911000002").await;
    let association = engine
        .create_association(CreateAssociationCmd::new(
            "Selam Edir",
            creator,
            MoneyCents::new(20_000),
        ))
        .await
        .unwrap();
    engine
        .join_association(association.id, member)
        .await
        .unwrap();

    let rejected = engine
        .review_membership(
            ReviewMembershipCmd::new(
                association.id,
                member,
                creator,
                MembershipStatus::Rejected,
            )
            .reason("unpaid history"),
        )
        .await
        .unwrap();
    assert_eq!(rejected.status, MembershipStatus::Rejected);
    assert_eq!(rejected.reason.as_deref(), Some("unpaid history"));

    let again = engine
        .join_association(association.id, member)
        .await
        .unwrap();
    assert_eq!(again.status, MembershipStatus::Pending);
    assert!(again.checker.is_none());
    assert!(again.reason.is_none());
}

#[tokio::test]
async fn blocked_member_cannot_rejoin() {
    let (engine, _db) = engine_with_db().await;
    let creator = register(&engine, "Abebe Kebede", "0911000001").await;
    let member = register(&engine, "Hirut Bekele", "0911000002").await;
    let association = engine
        .create_association(CreateAssociationCmd::new(
            "Selam Edir",
            creator,
            MoneyCents::new(20_000),
        ))
        .await
        .unwrap();
    engine
        .join_association(association.id, member)
        .await
        .unwrap();
    engine
        .review_membership(ReviewMembershipCmd::new(
            association.id,
            member,
            creator,
            MembershipStatus::Blocked,
        ))
        .await
        .unwrap();

    let err = engine
        .join_association(association.id, member)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::Forbidden("membership blocked".to_string()));
}

#[tokio::test]
async fn review_cannot_reset_to_pending() {
    let (engine, _db) = engine_with_db().await;
    let creator = register(&engine, "Abebe Kebede", "0911000001").await;
    let member = register(&engine, "Hirut Bekele", "0911000002").await;
    let association = engine
        .create_association(CreateAssociationCmd::new(
            "Selam Edir",
            creator,
            MoneyCents::new(20_000),
        ))
        .await
        .unwrap();
    engine
        .join_association(association.id, member)
        .await
        .unwrap();

    let err = engine
        .review_membership(ReviewMembershipCmd::new(
            association.id,
            member,
            creator,
            MembershipStatus::Pending,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidStatus(_)));
}

#[tokio::test]
async fn review_requires_committee() {
    let (engine, _db) = engine_with_db().await;
    let creator = register(&engine, "Abebe Kebede", "0911000001").await;
    let member = register(&engine, "Hirut Bekele", "0911000002").await;
    let outsider = register(&engine, "Mulu Alem", "0911000003").await;
    let association = engine
        .create_association(CreateAssociationCmd::new(
            "Selam Edir",
            creator,
            MoneyCents::new(20_000),
        ))
        .await
        .unwrap();
    engine
        .join_association(association.id, member)
        .await
        .unwrap();

    let err = engine
        .review_membership(ReviewMembershipCmd::new(
            association.id,
            member,
            outsider,
            MembershipStatus::Active,
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Forbidden("committee role required".to_string())
    );
}

#[tokio::test]
async fn membership_changes_are_audited() {
    let (engine, _db) = engine_with_db().await;
    let creator = register(&engine, "Abebe Kebede", "0911000001").await;
    let member = register(&engine, "Hirut Bekele", "0911000002").await;
    let association = engine
        .create_association(CreateAssociationCmd::new(
            "Selam Edir",
            creator,
            MoneyCents::new(20_000),
        ))
        .await
        .unwrap();
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

    let trail = engine
        .audit_trail(AuditSubject::Membership {
            association_id: association.id,
            member_id: member,
        })
        .await
        .unwrap();
    assert_eq!(trail.len(), 2);
    assert!(trail.iter().any(|e| e.action == AuditAction::Created));
    assert!(
        trail
            .iter()
            .any(|e| e.action == AuditAction::Modified && e.performed_by == creator)
    );

    let member_trail = engine
        .audit_trail(AuditSubject::Member { member_id: member })
        .await
        .unwrap();
    assert_eq!(member_trail.len(), 1);
    assert_eq!(member_trail[0].action, AuditAction::Created);
    assert_eq!(member_trail[0].performed_by, member);
}
