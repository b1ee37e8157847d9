//! Multisig gateway integration tests: replay protection, self-signing,
//! and cross-instance isolation.

use alloy_primitives::Address;
use deepmine_access::{signer_address, AccessRegistry, MsigGateway, MsigSignature, RoleSet};
use deepmine_core::{EngineError, ManualClock};
use ed25519_dalek::{Signer, SigningKey};

fn make_keypair(seed: u8) -> SigningKey {
    let mut secret = [0u8; 32];
    secret[0] = seed;
    SigningKey::from_bytes(&secret)
}

fn gateway_at(instance: Address, managers: &[&SigningKey]) -> (MsigGateway, Address) {
    let owner = Address::repeat_byte(1);
    let mut registry = AccessRegistry::new(instance, owner);
    for key in managers {
        let signer = signer_address(&key.verifying_key());
        registry
            .add_operator(owner, signer, RoleSet::ROLE_ACCESS_MANAGER)
            .unwrap();
    }
    (MsigGateway::new(registry), owner)
}

fn sign_request(
    gw: &MsigGateway,
    keys: &[&SigningKey],
    target: Address,
    role: RoleSet,
    expires_on: u64,
    clock: &ManualClock,
) -> Vec<MsigSignature> {
    let digest = gw
        .construct_update_request(target, role, expires_on, clock)
        .unwrap();
    keys.iter()
        .map(|key| MsigSignature {
            key: key.verifying_key(),
            signature: key.sign(digest.as_slice()),
        })
        .collect()
}

#[test]
fn replayed_signatures_fail_after_execution() {
    let (k1, k2) = (make_keypair(1), make_keypair(2));
    let (mut gw, owner) = gateway_at(Address::repeat_byte(0xAA), &[&k1, &k2]);
    let clock = ManualClock::new(1_000);
    let target = Address::repeat_byte(9);
    let role = RoleSet::ROLE_STATE_PROVIDER;

    let sigs = sign_request(&gw, &[&k1, &k2], target, role, 10_000, &clock);
    gw.update_msig(owner, target, role, 10_000, &sigs, &clock)
        .unwrap();
    assert_eq!(gw.nonce(), 1);

    // Same signature set again: the digest now commits to nonce 1, so the
    // old signatures no longer verify.
    assert!(matches!(
        gw.update_msig(owner, target, role, 10_000, &sigs, &clock),
        Err(EngineError::Unauthorized(_))
    ));

    // A freshly signed request under the new nonce succeeds.
    let fresh = sign_request(&gw, &[&k1, &k2], target, RoleSet::ROLE_AGE_PROVIDER, 10_000, &clock);
    gw.update_msig(owner, target, RoleSet::ROLE_AGE_PROVIDER, 10_000, &fresh, &clock)
        .unwrap();
    assert_eq!(gw.nonce(), 2);
    assert!(gw.registry().has_role(target, RoleSet::ROLE_AGE_PROVIDER));
}

#[test]
fn duplicate_signers_always_rejected() {
    let k1 = make_keypair(1);
    let (mut gw, owner) = gateway_at(Address::repeat_byte(0xAA), &[&k1]);
    let clock = ManualClock::new(1_000);
    let target = Address::repeat_byte(9);
    let role = RoleSet::ROLE_STATE_PROVIDER;

    // Two signatures from the same key: role sufficiency is irrelevant.
    let sigs = sign_request(&gw, &[&k1, &k1], target, role, 10_000, &clock);
    assert!(matches!(
        gw.update_msig(owner, target, role, 10_000, &sigs, &clock),
        Err(EngineError::Unauthorized(_))
    ));
}

#[test]
fn sender_as_sole_signer_rejected() {
    let k1 = make_keypair(1);
    let sender = signer_address(&k1.verifying_key());
    let (mut gw, _) = gateway_at(Address::repeat_byte(0xAA), &[&k1]);
    let clock = ManualClock::new(1_000);
    let target = Address::repeat_byte(9);
    let role = RoleSet::ROLE_STATE_PROVIDER;

    let sigs = sign_request(&gw, &[&k1], target, role, 10_000, &clock);
    assert!(matches!(
        gw.update_msig(sender, target, role, 10_000, &sigs, &clock),
        Err(EngineError::Unauthorized(_))
    ));
}

#[test]
fn one_signature_plus_qualifying_sender_executes() {
    let (k1, k2) = (make_keypair(1), make_keypair(2));
    let sender = signer_address(&k2.verifying_key());
    let (mut gw, _) = gateway_at(Address::repeat_byte(0xAA), &[&k1, &k2]);
    let clock = ManualClock::new(1_000);
    let target = Address::repeat_byte(9);
    let role = RoleSet::ROLE_STATE_PROVIDER;

    // k1 signs; k2's address submits the transaction. Two independent
    // qualifying parties.
    let sigs = sign_request(&gw, &[&k1], target, role, 10_000, &clock);
    gw.update_msig(sender, target, role, 10_000, &sigs, &clock)
        .unwrap();
    assert!(gw.registry().has_role(target, role));
}

#[test]
fn unqualified_sender_with_one_signature_rejected() {
    let k1 = make_keypair(1);
    let (mut gw, _) = gateway_at(Address::repeat_byte(0xAA), &[&k1]);
    let clock = ManualClock::new(1_000);
    let target = Address::repeat_byte(9);
    let role = RoleSet::ROLE_STATE_PROVIDER;

    let sigs = sign_request(&gw, &[&k1], target, role, 10_000, &clock);
    let stranger = Address::repeat_byte(0x77);
    assert!(matches!(
        gw.update_msig(stranger, target, role, 10_000, &sigs, &clock),
        Err(EngineError::Unauthorized(_))
    ));
}

#[test]
fn signatures_do_not_transfer_between_instances() {
    let (k1, k2) = (make_keypair(1), make_keypair(2));
    let clock = ManualClock::new(1_000);
    let target = Address::repeat_byte(9);
    let role = RoleSet::ROLE_STATE_PROVIDER;

    // Two independent deployments, identical owners, signers, parameters.
    let (gw_a, _) = gateway_at(Address::repeat_byte(0xAA), &[&k1, &k2]);
    let (mut gw_b, owner_b) = gateway_at(Address::repeat_byte(0xBB), &[&k1, &k2]);

    // Signed for instance A, submitted to instance B.
    let sigs = sign_request(&gw_a, &[&k1, &k2], target, role, 10_000, &clock);
    assert!(matches!(
        gw_b.update_msig(owner_b, target, role, 10_000, &sigs, &clock),
        Err(EngineError::Unauthorized(_))
    ));
    assert_eq!(gw_b.nonce(), 0);
}

#[test]
fn expiry_checked_against_injected_clock() {
    let (k1, k2) = (make_keypair(1), make_keypair(2));
    let (mut gw, owner) = gateway_at(Address::repeat_byte(0xAA), &[&k1, &k2]);
    let clock = ManualClock::new(1_000);
    let target = Address::repeat_byte(9);
    let role = RoleSet::ROLE_STATE_PROVIDER;

    let sigs = sign_request(&gw, &[&k1, &k2], target, role, 2_000, &clock);

    // Fast-forward past the expiry; the otherwise valid request dies.
    clock.advance(1_500);
    assert!(matches!(
        gw.update_msig(owner, target, role, 2_000, &sigs, &clock),
        Err(EngineError::Expired(_))
    ));

    // Rewind and it executes.
    clock.rewind(1_500);
    gw.update_msig(owner, target, role, 2_000, &sigs, &clock)
        .unwrap();
}
