//! Command structs for engine operations.
//!
//! These types group parameters for write operations (register/create
//! fee/pay/withdraw/update), keeping call sites readable and avoiding long
//! argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    AssignmentTarget, FamilyRelationship, FeeCategory, Gender, MembershipStatus, MoneyCents,
};

/// Who receives an obligation when a fee is created or updated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AssignmentPolicy {
    /// Every member holding an active membership in the association.
    #[default]
    AllActiveMembers,
    /// An explicit member list. Duplicates collapse; unknown ids are skipped
    /// and reported, never an error.
    CustomMemberList(Vec<Uuid>),
    /// No obligations at all.
    NoOne,
}

/// Register a new member.
#[derive(Clone, Debug)]
pub struct RegisterMemberCmd {
    pub full_name: String,
    pub phone: String,
    pub password: String,
}

impl RegisterMemberCmd {
    #[must_use]
    pub fn new(
        full_name: impl Into<String>,
        phone: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            phone: phone.into(),
            password: password.into(),
        }
    }
}

/// Create an association; the creator becomes its first committee member.
#[derive(Clone, Debug)]
pub struct CreateAssociationCmd {
    pub name: String,
    pub monthly_fee: MoneyCents,
    pub city: Option<String>,
    pub meeting_place: Option<String>,
    pub created_by: Uuid,
}

impl CreateAssociationCmd {
    #[must_use]
    pub fn new(name: impl Into<String>, created_by: Uuid, monthly_fee: MoneyCents) -> Self {
        Self {
            name: name.into(),
            monthly_fee,
            city: None,
            meeting_place: None,
            created_by,
        }
    }

    #[must_use]
    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    #[must_use]
    pub fn meeting_place(mut self, meeting_place: impl Into<String>) -> Self {
        self.meeting_place = Some(meeting_place.into());
        self
    }
}

/// Declare a dependent on a member's record.
#[derive(Clone, Debug)]
pub struct AddFamilyMemberCmd {
    pub member_id: Uuid,
    pub full_name: String,
    pub gender: Gender,
    pub relationship: FamilyRelationship,
    pub profession: Option<String>,
    pub performed_by: Uuid,
}

impl AddFamilyMemberCmd {
    #[must_use]
    pub fn new(
        member_id: Uuid,
        performed_by: Uuid,
        full_name: impl Into<String>,
        gender: Gender,
        relationship: FamilyRelationship,
    ) -> Self {
        Self {
            member_id,
            full_name: full_name.into(),
            gender,
            relationship,
            profession: None,
            performed_by,
        }
    }

    #[must_use]
    pub fn profession(mut self, profession: impl Into<String>) -> Self {
        self.profession = Some(profession.into());
        self
    }
}

/// Settle or change a membership (checker side of maker/checker).
#[derive(Clone, Debug)]
pub struct ReviewMembershipCmd {
    pub association_id: Uuid,
    pub member_id: Uuid,
    pub status: MembershipStatus,
    pub reason: Option<String>,
    pub performed_by: Uuid,
}

impl ReviewMembershipCmd {
    #[must_use]
    pub fn new(
        association_id: Uuid,
        member_id: Uuid,
        performed_by: Uuid,
        status: MembershipStatus,
    ) -> Self {
        Self {
            association_id,
            member_id,
            status,
            reason: None,
            performed_by,
        }
    }

    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Create a deposit fee and fan out obligations per the policy.
#[derive(Clone, Debug)]
pub struct CreateFeeCmd {
    pub association_id: Uuid,
    pub name: String,
    pub category: FeeCategory,
    pub amount: MoneyCents,
    pub reason: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub policy: AssignmentPolicy,
    /// Member the association covers for this fee; their row is created as
    /// `ForYou` instead of `NotPaid`.
    pub supported_member: Option<Uuid>,
    pub performed_by: Uuid,
}

impl CreateFeeCmd {
    #[must_use]
    pub fn new(
        association_id: Uuid,
        performed_by: Uuid,
        name: impl Into<String>,
        category: FeeCategory,
        amount: MoneyCents,
    ) -> Self {
        Self {
            association_id,
            name: name.into(),
            category,
            amount,
            reason: None,
            due_date: None,
            policy: AssignmentPolicy::default(),
            supported_member: None,
            performed_by,
        }
    }

    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    #[must_use]
    pub fn policy(mut self, policy: AssignmentPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn supported_member(mut self, member_id: Uuid) -> Self {
        self.supported_member = Some(member_id);
        self
    }
}

/// Update a deposit fee and regenerate its open obligations.
#[derive(Clone, Debug)]
pub struct UpdateFeeCmd {
    pub fee_id: Uuid,
    pub performed_by: Uuid,

    pub name: Option<String>,
    pub category: Option<FeeCategory>,
    pub amount: Option<MoneyCents>,
    pub reason: Option<String>,
    pub due_date: Option<DateTime<Utc>>,

    pub policy: AssignmentPolicy,
    pub supported_member: Option<Uuid>,
}

impl UpdateFeeCmd {
    #[must_use]
    pub fn new(fee_id: Uuid, performed_by: Uuid) -> Self {
        Self {
            fee_id,
            performed_by,
            name: None,
            category: None,
            amount: None,
            reason: None,
            due_date: None,
            policy: AssignmentPolicy::default(),
            supported_member: None,
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn category(mut self, category: FeeCategory) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn amount(mut self, amount: MoneyCents) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    #[must_use]
    pub fn policy(mut self, policy: AssignmentPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn supported_member(mut self, member_id: Uuid) -> Self {
        self.supported_member = Some(member_id);
        self
    }
}

/// Mark a batch of obligations paid under one shared reference.
#[derive(Clone, Debug)]
pub struct PayFeesCmd {
    pub assignment_ids: Vec<Uuid>,
    pub method: String,
    pub bank_id: Option<Uuid>,
    pub proof_image: Option<String>,
    /// External reference (e.g. from the payment provider); generated when
    /// absent.
    pub trx_ref: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub performed_by: Uuid,
}

impl PayFeesCmd {
    #[must_use]
    pub fn new(performed_by: Uuid, assignment_ids: Vec<Uuid>, method: impl Into<String>) -> Self {
        Self {
            assignment_ids,
            method: method.into(),
            bank_id: None,
            proof_image: None,
            trx_ref: None,
            paid_at: None,
            performed_by,
        }
    }

    #[must_use]
    pub fn bank_id(mut self, bank_id: Uuid) -> Self {
        self.bank_id = Some(bank_id);
        self
    }

    #[must_use]
    pub fn proof_image(mut self, proof_image: impl Into<String>) -> Self {
        self.proof_image = Some(proof_image.into());
        self
    }

    #[must_use]
    pub fn trx_ref(mut self, trx_ref: impl Into<String>) -> Self {
        self.trx_ref = Some(trx_ref.into());
        self
    }

    #[must_use]
    pub fn paid_at(mut self, paid_at: DateTime<Utc>) -> Self {
        self.paid_at = Some(paid_at);
        self
    }
}

/// Staff shortcut for recording out-of-band payments (cash at a meeting).
///
/// No bank or proof image is recorded.
#[derive(Clone, Debug)]
pub struct AdminPayFeesCmd {
    pub assignment_ids: Vec<Uuid>,
    pub method: String,
    pub trx_ref: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub performed_by: Uuid,
}

impl AdminPayFeesCmd {
    #[must_use]
    pub fn new(performed_by: Uuid, assignment_ids: Vec<Uuid>, method: impl Into<String>) -> Self {
        Self {
            assignment_ids,
            method: method.into(),
            trx_ref: None,
            paid_at: None,
            performed_by,
        }
    }

    #[must_use]
    pub fn trx_ref(mut self, trx_ref: impl Into<String>) -> Self {
        self.trx_ref = Some(trx_ref.into());
        self
    }

    #[must_use]
    pub fn paid_at(mut self, paid_at: DateTime<Utc>) -> Self {
        self.paid_at = Some(paid_at);
        self
    }
}

/// Record money leaving the till: a withdrawal fee settled on creation.
#[derive(Clone, Debug)]
pub struct WithdrawCmd {
    pub association_id: Uuid,
    pub name: String,
    pub category: FeeCategory,
    pub amount: MoneyCents,
    pub reason: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    /// Beneficiary: a member (support payout) or the association itself
    /// (running costs).
    pub target: AssignmentTarget,
    pub method: Option<String>,
    pub bank_id: Option<Uuid>,
    pub proof_image: Option<String>,
    pub performed_by: Uuid,
}

impl WithdrawCmd {
    #[must_use]
    pub fn new(
        association_id: Uuid,
        performed_by: Uuid,
        name: impl Into<String>,
        category: FeeCategory,
        amount: MoneyCents,
        target: AssignmentTarget,
    ) -> Self {
        Self {
            association_id,
            name: name.into(),
            category,
            amount,
            reason: None,
            due_date: None,
            target,
            method: None,
            bank_id: None,
            proof_image: None,
            performed_by,
        }
    }

    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    #[must_use]
    pub fn bank_id(mut self, bank_id: Uuid) -> Self {
        self.bank_id = Some(bank_id);
        self
    }

    #[must_use]
    pub fn proof_image(mut self, proof_image: impl Into<String>) -> Self {
        self.proof_image = Some(proof_image.into());
        self
    }
}

/// Rewrite an existing withdrawal: patch the fee, re-settle the target.
#[derive(Clone, Debug)]
pub struct UpdateExpenseCmd {
    pub fee_id: Uuid,
    pub performed_by: Uuid,

    pub name: Option<String>,
    pub category: Option<FeeCategory>,
    pub amount: Option<MoneyCents>,
    pub reason: Option<String>,
    pub due_date: Option<DateTime<Utc>>,

    pub target: AssignmentTarget,
    pub method: Option<String>,
    pub bank_id: Option<Uuid>,
    pub proof_image: Option<String>,
}

impl UpdateExpenseCmd {
    #[must_use]
    pub fn new(fee_id: Uuid, performed_by: Uuid, target: AssignmentTarget) -> Self {
        Self {
            fee_id,
            performed_by,
            name: None,
            category: None,
            amount: None,
            reason: None,
            due_date: None,
            target,
            method: None,
            bank_id: None,
            proof_image: None,
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn category(mut self, category: FeeCategory) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn amount(mut self, amount: MoneyCents) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    #[must_use]
    pub fn bank_id(mut self, bank_id: Uuid) -> Self {
        self.bank_id = Some(bank_id);
        self
    }

    #[must_use]
    pub fn proof_image(mut self, proof_image: impl Into<String>) -> Self {
        self.proof_image = Some(proof_image.into());
        self
    }
}
