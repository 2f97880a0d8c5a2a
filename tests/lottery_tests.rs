use solana_program::{
    hash::Hash,
    instruction::{Instruction, InstructionError},
    pubkey::Pubkey,
    sysvar::clock::Clock,
};
use solana_program_test::*;
use solana_sdk::{
    signature::{Keypair, Signer},
    system_instruction,
    transaction::{Transaction, TransactionError},
};

use autolotto::{
    config::LotteryConfig,
    error::LotteryError,
    instruction,
    process_instruction,
    state::{Lottery, RoundPhase},
    utils::sol_to_lamports,
};

const INTERVAL: u64 = 30;

fn entrance_fee() -> u64 {
    sol_to_lamports(0.01)
}

fn config() -> LotteryConfig {
    LotteryConfig {
        entrance_fee: entrance_fee(),
        interval: INTERVAL,
        subscription_id: 123_123,
        key_hash: [0x79; 32],
        ..LotteryConfig::default()
    }
}

struct TestLottery {
    context: ProgramTestContext,
    program_id: Pubkey,
    lottery: Keypair,
    oracle: Keypair,
}

// Setup program test with an initialized lottery
async fn setup() -> TestLottery {
    let program_id = Pubkey::new_unique();
    let program_test = ProgramTest::new("autolotto", program_id, processor!(process_instruction));
    let mut context = program_test.start_with_context().await;

    let lottery = Keypair::new();
    let oracle = Keypair::new();
    let initialize_ix = instruction::initialize(
        &program_id,
        &context.payer.pubkey(),
        &lottery.pubkey(),
        &oracle.pubkey(),
        config(),
    );
    process(&mut context, &[initialize_ix], &[&lottery], false)
        .await
        .unwrap();

    TestLottery {
        context,
        program_id,
        lottery,
        oracle,
    }
}

async fn process(
    context: &mut ProgramTestContext,
    instructions: &[Instruction],
    signers: &[&Keypair],
    fresh_blockhash: bool,
) -> Result<(), BanksClientError> {
    // Identical transactions need a new blockhash or they are deduplicated
    let blockhash = if fresh_blockhash {
        let blockhash = context
            .banks_client
            .get_new_latest_blockhash(&context.last_blockhash)
            .await
            .unwrap();
        context.last_blockhash = blockhash;
        blockhash
    } else {
        context.banks_client.get_latest_blockhash().await.unwrap()
    };
    let transaction = {
        let mut keypairs = vec![&context.payer];
        keypairs.extend_from_slice(signers);
        Transaction::new_signed_with_payer(
            instructions,
            Some(&context.payer.pubkey()),
            &keypairs,
            blockhash,
        )
    };
    context.banks_client.process_transaction(transaction).await
}

fn assert_lottery_error(result: Result<(), BanksClientError>, expected: LotteryError) {
    assert_eq!(
        result.unwrap_err().unwrap(),
        TransactionError::InstructionError(0, InstructionError::Custom(expected as u32))
    );
}

impl TestLottery {
    async fn state(&mut self) -> Lottery {
        let account = self
            .context
            .banks_client
            .get_account(self.lottery.pubkey())
            .await
            .unwrap()
            .unwrap();
        Lottery::unpack(&account.data).unwrap()
    }

    async fn lamports(&mut self, key: Pubkey) -> u64 {
        self.context
            .banks_client
            .get_balance(key)
            .await
            .unwrap()
    }

    async fn clock(&mut self) -> Clock {
        self.context.banks_client.get_sysvar::<Clock>().await.unwrap()
    }

    async fn advance_clock(&mut self, seconds: i64) {
        let mut clock = self.clock().await;
        clock.unix_timestamp += seconds;
        self.context.set_sysvar(&clock);
    }

    async fn funded_player(&mut self) -> Keypair {
        let player = Keypair::new();
        let fund_ix = system_instruction::transfer(
            &self.context.payer.pubkey(),
            &player.pubkey(),
            sol_to_lamports(1.0),
        );
        process(&mut self.context, &[fund_ix], &[], false).await.unwrap();
        player
    }

    async fn enter(&mut self, player: &Keypair, amount: u64) -> Result<(), BanksClientError> {
        let enter_ix = instruction::enter(&self.program_id, &player.pubkey(), &self.lottery.pubkey(), amount);
        process(&mut self.context, &[enter_ix], &[player], false).await
    }

    async fn perform_upkeep(&mut self, fresh_blockhash: bool) -> Result<(), BanksClientError> {
        let caller = self.context.payer.pubkey();
        let upkeep_ix = instruction::perform_upkeep(&self.program_id, &caller, &self.lottery.pubkey());
        process(&mut self.context, &[upkeep_ix], &[], fresh_blockhash).await
    }

    async fn fulfill(
        &mut self,
        signer: &Keypair,
        winner: Pubkey,
        request_id: Hash,
        random_words: Vec<u64>,
        fresh_blockhash: bool,
    ) -> Result<(), BanksClientError> {
        let fulfill_ix = instruction::fulfill_random_words(
            &self.program_id,
            &signer.pubkey(),
            &self.lottery.pubkey(),
            &winner,
            request_id,
            random_words,
        );
        process(&mut self.context, &[fulfill_ix], &[signer], fresh_blockhash).await
    }
}

#[tokio::test]
async fn test_initialize() {
    let mut test = setup().await;
    let clock = test.clock().await;
    let state = test.state().await;

    assert!(state.is_initialized);
    assert_eq!(state.current_phase(), RoundPhase::Open);
    assert_eq!(state.entrance_fee(), entrance_fee());
    assert_eq!(state.interval(), INTERVAL);
    assert_eq!(state.last_draw_timestamp(), clock.unix_timestamp);
    assert_eq!(state.oracle, test.oracle.pubkey());
    assert_eq!(state.entrant_count(), 0);
    assert_eq!(state.pending_request_id(), None);
}

#[tokio::test]
async fn test_initialize_twice_fails() {
    let mut test = setup().await;
    let initialize_ix = instruction::initialize(
        &test.program_id,
        &test.context.payer.pubkey(),
        &test.lottery.pubkey(),
        &test.oracle.pubkey(),
        config(),
    );
    let lottery = Keypair::from_bytes(&test.lottery.to_bytes()).unwrap();
    let result = process(&mut test.context, &[initialize_ix], &[&lottery], true).await;
    assert_lottery_error(result, LotteryError::AlreadyInitialized);
}

#[tokio::test]
async fn test_initialize_rejects_zero_fee() {
    let program_id = Pubkey::new_unique();
    let program_test = ProgramTest::new("autolotto", program_id, processor!(process_instruction));
    let mut context = program_test.start_with_context().await;

    let lottery = Keypair::new();
    let initialize_ix = instruction::initialize(
        &program_id,
        &context.payer.pubkey(),
        &lottery.pubkey(),
        &Pubkey::new_unique(),
        LotteryConfig {
            entrance_fee: 0,
            ..config()
        },
    );
    let result = process(&mut context, &[initialize_ix], &[&lottery], false).await;
    assert_lottery_error(result, LotteryError::InvalidConfig);
}

#[tokio::test]
async fn test_enter_records_player_and_pot() {
    let mut test = setup().await;
    let player = test.funded_player().await;
    let lottery_before = test.lamports(test.lottery.pubkey()).await;

    test.enter(&player, entrance_fee()).await.unwrap();

    let state = test.state().await;
    assert_eq!(state.entrant_count(), 1);
    assert_eq!(state.entrant_at(0), Ok(&player.pubkey()));
    assert_eq!(state.balance(), entrance_fee());
    assert_eq!(
        test.lamports(test.lottery.pubkey()).await,
        lottery_before + entrance_fee()
    );
}

#[tokio::test]
async fn test_enter_underpaid_fails() {
    let mut test = setup().await;
    let player = test.funded_player().await;

    let result = test.enter(&player, entrance_fee() - 1).await;
    assert_lottery_error(result, LotteryError::InsufficientPayment);
    assert_eq!(test.state().await.entrant_count(), 0);
}

#[tokio::test]
async fn test_check_upkeep_is_read_only() {
    let mut test = setup().await;
    let before = test.state().await;

    let check_ix = instruction::check_upkeep(&test.program_id, &test.lottery.pubkey());
    process(&mut test.context, &[check_ix], &[], false).await.unwrap();

    assert_eq!(test.state().await, before);
}

#[tokio::test]
async fn test_single_entrant_round() {
    let mut test = setup().await;
    let player = test.funded_player().await;
    test.enter(&player, entrance_fee()).await.unwrap();
    let started = test.state().await.last_draw_timestamp();

    test.advance_clock(29).await;
    assert_lottery_error(test.perform_upkeep(false).await, LotteryError::UpkeepNotNeeded);

    test.advance_clock(2).await;
    test.perform_upkeep(true).await.unwrap();
    let state = test.state().await;
    assert_eq!(state.current_phase(), RoundPhase::Calculating);
    assert_eq!(state.last_draw_timestamp(), started);
    let request_id = state.pending_request_id().unwrap();

    // entry and a second draw are closed while calculating
    let latecomer = test.funded_player().await;
    assert_lottery_error(
        test.enter(&latecomer, entrance_fee()).await,
        LotteryError::RoundNotOpen,
    );
    assert_lottery_error(test.perform_upkeep(true).await, LotteryError::UpkeepNotNeeded);

    let oracle = Keypair::from_bytes(&test.oracle.to_bytes()).unwrap();
    let wrong_id = Hash::new_unique();
    assert_lottery_error(
        test.fulfill(&oracle, player.pubkey(), wrong_id, vec![7], false).await,
        LotteryError::UnknownRequest,
    );
    let impostor = Keypair::new();
    assert_lottery_error(
        test.fulfill(&impostor, player.pubkey(), request_id, vec![7], false).await,
        LotteryError::OnlyOracleCanFulfill,
    );
    assert_eq!(test.state().await.pending_request_id(), Some(request_id));

    let winner_before = test.lamports(player.pubkey()).await;
    test.fulfill(&oracle, player.pubkey(), request_id, vec![7], false)
        .await
        .unwrap();

    let state = test.state().await;
    let clock = test.clock().await;
    assert_eq!(state.current_phase(), RoundPhase::Open);
    assert_eq!(state.entrant_count(), 0);
    assert_eq!(state.balance(), 0);
    assert_eq!(state.pending_request_id(), None);
    assert_eq!(state.recent_winner(), Some(player.pubkey()));
    assert_eq!(state.last_draw_timestamp(), clock.unix_timestamp);
    assert!(state.last_draw_timestamp() > started);
    assert_eq!(
        test.lamports(player.pubkey()).await,
        winner_before + entrance_fee()
    );

    // replaying the consumed id is rejected
    assert_lottery_error(
        test.fulfill(&oracle, player.pubkey(), request_id, vec![7], true).await,
        LotteryError::UnknownRequest,
    );

    // the next round accepts entries again; same transaction as the rejected one
    let enter_ix = instruction::enter(
        &test.program_id,
        &latecomer.pubkey(),
        &test.lottery.pubkey(),
        entrance_fee(),
    );
    process(&mut test.context, &[enter_ix], &[&latecomer], true)
        .await
        .unwrap();
    assert_eq!(test.state().await.entrant_count(), 1);
}

#[tokio::test]
async fn test_four_entrants_pays_index_two() {
    let mut test = setup().await;
    let mut players = Vec::new();
    for _ in 0..4 {
        let player = test.funded_player().await;
        test.enter(&player, entrance_fee()).await.unwrap();
        players.push(player);
    }
    test.advance_clock(INTERVAL as i64 + 1).await;
    test.perform_upkeep(false).await.unwrap();
    let request_id = test.state().await.pending_request_id().unwrap();

    let lottery_before = test.lamports(test.lottery.pubkey()).await;
    let winner_before = test.lamports(players[2].pubkey()).await;
    let oracle = Keypair::from_bytes(&test.oracle.to_bytes()).unwrap();
    test.fulfill(&oracle, players[2].pubkey(), request_id, vec![10], false)
        .await
        .unwrap();

    assert_eq!(
        test.lamports(players[2].pubkey()).await,
        winner_before + 4 * entrance_fee()
    );
    assert_eq!(
        test.lamports(test.lottery.pubkey()).await,
        lottery_before - 4 * entrance_fee()
    );
    assert_eq!(test.state().await.recent_winner(), Some(players[2].pubkey()));
}

#[tokio::test]
async fn test_wrong_winner_account_keeps_request_pending() {
    let mut test = setup().await;
    let mut players = Vec::new();
    for _ in 0..4 {
        let player = test.funded_player().await;
        test.enter(&player, entrance_fee()).await.unwrap();
        players.push(player);
    }
    test.advance_clock(INTERVAL as i64 + 1).await;
    test.perform_upkeep(false).await.unwrap();
    let request_id = test.state().await.pending_request_id().unwrap();
    let oracle = Keypair::from_bytes(&test.oracle.to_bytes()).unwrap();

    // word 10 selects index 2; index 0 is supplied instead
    let result = test
        .fulfill(&oracle, players[0].pubkey(), request_id, vec![10], false)
        .await;
    assert_lottery_error(result, LotteryError::TransferFailed);

    let state = test.state().await;
    assert_eq!(state.current_phase(), RoundPhase::Calculating);
    assert_eq!(state.pending_request_id(), Some(request_id));
    assert_eq!(state.entrant_count(), 4);

    test.fulfill(&oracle, players[2].pubkey(), request_id, vec![10], false)
        .await
        .unwrap();
    assert_eq!(test.state().await.current_phase(), RoundPhase::Open);
}
