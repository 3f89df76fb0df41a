use solana_program::program_pack::Pack;
use solana_program_test::*;
use solana_sdk::{
    account::Account,
    instruction::{Instruction, InstructionError},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    system_instruction,
    sysvar::clock::Clock,
    transaction::{Transaction, TransactionError},
};

use vrf_lottery::{
    error::LotteryError,
    instruction,
    process_instruction,
    state::{Config, Coordinator, LotteryParams, LotteryState, Round},
    utils::{find_config_address, find_coordinator_address, find_round_address},
    vrf::{winner_index, word_from_u64},
};

const PLAYER_FUNDS: u64 = 1_000_000_000; // 1 SOL

struct TestLottery {
    context: ProgramTestContext,
    program_id: Pubkey,
    oracle: Keypair,
}

impl TestLottery {
    async fn new() -> Self {
        let program_id = Pubkey::new_unique();
        let program_test = ProgramTest::new("vrf_lottery", program_id, processor!(process_instruction));
        let context = program_test.start_with_context().await;

        Self {
            context,
            program_id,
            oracle: Keypair::new(),
        }
    }

    async fn start(entrance_fee: u64, interval: u64) -> Self {
        let mut lottery = Self::new().await;
        let params = LotteryParams {
            entrance_fee,
            interval,
            oracle: lottery.oracle.pubkey(),
            ..LotteryParams::default()
        };
        lottery.initialize(params).await.unwrap();
        lottery
    }

    async fn initialize(&mut self, params: LotteryParams) -> Result<(), BanksClientError> {
        let authority = self.context.payer.pubkey();
        let ix = instruction::initialize_lottery(&self.program_id, &authority, params);
        self.send(&[ix], &[]).await
    }

    async fn send(
        &mut self,
        instructions: &[Instruction],
        signers: &[&Keypair],
    ) -> Result<(), BanksClientError> {
        let blockhash = self
            .context
            .banks_client
            .get_new_latest_blockhash(&self.context.last_blockhash)
            .await
            .unwrap();
        self.context.last_blockhash = blockhash;
        let mut all_signers = vec![&self.context.payer];
        all_signers.extend_from_slice(signers);

        let transaction = Transaction::new_signed_with_payer(
            instructions,
            Some(&self.context.payer.pubkey()),
            &all_signers,
            blockhash,
        );
        self.context.banks_client.process_transaction(transaction).await
    }

    async fn funded_player(&mut self) -> Keypair {
        let player = Keypair::new();
        let payer = self.context.payer.pubkey();
        self.send(
            &[system_instruction::transfer(&payer, &player.pubkey(), PLAYER_FUNDS)],
            &[],
        )
        .await
        .unwrap();
        player
    }

    async fn enter(&mut self, player: &Keypair, amount: u64) -> Result<(), BanksClientError> {
        let ix = instruction::enter_lottery(&self.program_id, &player.pubkey(), amount);
        self.send(&[ix], &[player]).await
    }

    /// `nonce` only keeps otherwise identical transactions distinct
    async fn perform_upkeep(&mut self, nonce: u8) -> Result<(), BanksClientError> {
        let ix = instruction::perform_upkeep(&self.program_id, vec![nonce]);
        self.send(&[ix], &[]).await
    }

    async fn fulfill(
        &mut self,
        winner: &Pubkey,
        request_id: u64,
        word: u64,
    ) -> Result<(), BanksClientError> {
        let ix = instruction::fulfill_random_words(
            &self.program_id,
            &self.oracle.pubkey(),
            winner,
            request_id,
            vec![word_from_u64(word)],
        );
        let oracle = Keypair::from_bytes(&self.oracle.to_bytes()).unwrap();
        self.send(&[ix], &[&oracle]).await
    }

    async fn advance_clock(&mut self, seconds: i64) {
        let mut clock: Clock = self.context.banks_client.get_sysvar().await.unwrap();
        clock.unix_timestamp += seconds;
        self.context.set_sysvar(&clock);
    }

    async fn account(&mut self, address: Pubkey) -> Account {
        self.context
            .banks_client
            .get_account(address)
            .await
            .unwrap()
            .unwrap()
    }

    async fn round(&mut self) -> Round {
        let account = self.account(find_round_address(&self.program_id).0).await;
        Round::unpack(&account.data).unwrap()
    }

    async fn lamports(&mut self, address: Pubkey) -> u64 {
        self.account(address).await.lamports
    }
}

fn assert_lottery_error(result: Result<(), BanksClientError>, expected: LotteryError) {
    assert_eq!(
        result.unwrap_err().unwrap(),
        TransactionError::InstructionError(0, InstructionError::Custom(expected as u32))
    );
}

#[tokio::test]
async fn test_initialize_lottery() {
    let mut lottery = TestLottery::start(10_000_000, 30).await;
    let program_id = lottery.program_id;

    let config_account = lottery.account(find_config_address(&program_id).0).await;
    let config = Config::unpack(&config_account.data).unwrap();
    assert_eq!(config.entrance_fee(), 10_000_000);
    assert_eq!(config.interval(), 30);
    assert_eq!(config.authority, lottery.context.payer.pubkey());

    let coordinator_account = lottery.account(find_coordinator_address(&program_id).0).await;
    let coordinator = Coordinator::unpack(&coordinator_account.data).unwrap();
    assert_eq!(coordinator.oracle, lottery.oracle.pubkey());
    assert_eq!(coordinator.next_request_id, 1);

    let round = lottery.round().await;
    assert_eq!(round.state(), LotteryState::Open);
    assert_eq!(round.number_of_players(), 0);
    assert_eq!(round.pending_request_id(), None);
    assert_eq!(round.recent_winner(), None);
}

#[tokio::test]
async fn test_initialize_twice_fails() {
    let mut lottery = TestLottery::start(10_000_000, 30).await;
    let params = LotteryParams {
        entrance_fee: 5,
        oracle: lottery.oracle.pubkey(),
        ..LotteryParams::default()
    };

    let result = lottery.initialize(params).await;
    assert_lottery_error(result, LotteryError::AlreadyInitialized);
}

#[tokio::test]
async fn test_initialize_without_oracle_fails() {
    let mut lottery = TestLottery::new().await;

    let result = lottery.initialize(LotteryParams::default()).await;
    assert_lottery_error(result, LotteryError::InvalidConfig);
}

#[tokio::test]
async fn test_initialize_with_prefunded_accounts() {
    let mut lottery = TestLottery::new().await;
    let payer = lottery.context.payer.pubkey();
    let round_address = find_round_address(&lottery.program_id).0;
    let config_address = find_config_address(&lottery.program_id).0;
    lottery
        .send(
            &[
                system_instruction::transfer(&payer, &round_address, 1_000_000),
                system_instruction::transfer(&payer, &config_address, 1_000_000),
            ],
            &[],
        )
        .await
        .unwrap();

    let params = LotteryParams {
        oracle: lottery.oracle.pubkey(),
        ..LotteryParams::default()
    };
    lottery.initialize(params).await.unwrap();

    let round_account = lottery.account(round_address).await;
    assert_eq!(round_account.owner, lottery.program_id);
    assert_eq!(round_account.data.len(), Round::LEN);
    let round = Round::unpack(&round_account.data).unwrap();
    assert_eq!(round.state(), LotteryState::Open);
    assert_eq!(lottery.account(config_address).await.owner, lottery.program_id);

    let player = lottery.funded_player().await;
    lottery.enter(&player, 10_000_000).await.unwrap();
    assert_eq!(lottery.round().await.number_of_players(), 1);
}

#[tokio::test]
async fn test_enter_records_player_and_escrows_deposit() {
    let mut lottery = TestLottery::start(10_000_000, 30).await;
    let player = lottery.funded_player().await;
    let round_address = find_round_address(&lottery.program_id).0;
    let escrow_before = lottery.lamports(round_address).await;

    lottery.enter(&player, 10_000_000).await.unwrap();

    let round = lottery.round().await;
    assert_eq!(round.number_of_players(), 1);
    assert_eq!(round.player(0), Some(&player.pubkey()));
    assert_eq!(round.state(), LotteryState::Open);
    assert_eq!(lottery.lamports(round_address).await, escrow_before + 10_000_000);
}

#[tokio::test]
async fn test_enter_without_enough_funds_fails() {
    let mut lottery = TestLottery::start(10_000_000, 30).await;
    let player = lottery.funded_player().await;

    let result = lottery.enter(&player, 0).await;
    assert_lottery_error(result, LotteryError::InsufficientFee);

    let result = lottery.enter(&player, 9_999_999).await;
    assert_lottery_error(result, LotteryError::InsufficientFee);

    assert_eq!(lottery.round().await.number_of_players(), 0);
}

#[tokio::test]
async fn test_perform_upkeep_before_interval_fails() {
    let mut lottery = TestLottery::start(10_000_000, 30).await;
    let player = lottery.funded_player().await;
    lottery.enter(&player, 10_000_000).await.unwrap();

    let result = lottery.perform_upkeep(0).await;
    assert_lottery_error(result, LotteryError::UpkeepNotNeeded);
    assert_eq!(lottery.round().await.state(), LotteryState::Open);
}

#[tokio::test]
async fn test_check_upkeep_does_not_change_state() {
    let mut lottery = TestLottery::start(10_000_000, 30).await;
    let player = lottery.funded_player().await;
    lottery.enter(&player, 10_000_000).await.unwrap();
    let before = lottery.round().await;

    let ix = instruction::check_upkeep(&lottery.program_id, vec![]);
    lottery.send(&[ix], &[]).await.unwrap();
    lottery.advance_clock(31).await;
    let ix = instruction::check_upkeep(&lottery.program_id, vec![1]);
    lottery.send(&[ix], &[]).await.unwrap();

    assert_eq!(lottery.round().await, before);
}

#[tokio::test]
async fn test_calculating_round_rejects_entries_and_second_upkeep() {
    let mut lottery = TestLottery::start(10_000_000, 30).await;
    let player = lottery.funded_player().await;
    let latecomer = lottery.funded_player().await;
    lottery.enter(&player, 10_000_000).await.unwrap();
    lottery.advance_clock(31).await;

    lottery.perform_upkeep(0).await.unwrap();

    let round = lottery.round().await;
    assert_eq!(round.state(), LotteryState::Calculating);
    assert_eq!(round.pending_request_id(), Some(1));

    let result = lottery.enter(&latecomer, 10_000_000).await;
    assert_lottery_error(result, LotteryError::RoundNotOpen);

    let result = lottery.perform_upkeep(1).await;
    assert_lottery_error(result, LotteryError::UpkeepNotNeeded);

    let round = lottery.round().await;
    assert_eq!(round.number_of_players(), 1);
    assert_eq!(round.pending_request_id(), Some(1));
}

#[tokio::test]
async fn test_fulfill_can_only_follow_perform_upkeep() {
    let mut lottery = TestLottery::start(10_000_000, 30).await;
    let player = lottery.funded_player().await;
    lottery.enter(&player, 10_000_000).await.unwrap();
    lottery.advance_clock(31).await;

    let result = lottery.fulfill(&player.pubkey(), 0, 7).await;
    assert_lottery_error(result, LotteryError::UnknownRequest);
    let result = lottery.fulfill(&player.pubkey(), 1, 7).await;
    assert_lottery_error(result, LotteryError::UnknownRequest);
}

#[tokio::test]
async fn test_fulfill_from_unregistered_signer_fails() {
    let mut lottery = TestLottery::start(10_000_000, 30).await;
    let player = lottery.funded_player().await;
    lottery.enter(&player, 10_000_000).await.unwrap();
    lottery.advance_clock(31).await;
    lottery.perform_upkeep(0).await.unwrap();

    let impostor = Keypair::new();
    let ix = instruction::fulfill_random_words(
        &lottery.program_id,
        &impostor.pubkey(),
        &player.pubkey(),
        1,
        vec![word_from_u64(7)],
    );
    let result = lottery.send(&[ix], &[&impostor]).await;
    assert_lottery_error(result, LotteryError::UnauthorizedOracle);
    assert_eq!(lottery.round().await.state(), LotteryState::Calculating);
}

#[tokio::test]
async fn test_single_player_round_pays_fee_back() {
    let mut lottery = TestLottery::start(1, 30).await;
    let player = lottery.funded_player().await;
    lottery.enter(&player, 1).await.unwrap();
    lottery.advance_clock(31).await;
    lottery.perform_upkeep(0).await.unwrap();
    let balance_before = lottery.lamports(player.pubkey()).await;

    lottery.fulfill(&player.pubkey(), 1, 7).await.unwrap();

    let round = lottery.round().await;
    assert_eq!(round.state(), LotteryState::Open);
    assert_eq!(round.number_of_players(), 0);
    assert_eq!(round.pending_request_id(), None);
    assert_eq!(round.recent_winner().map(|record| record.winner), Some(player.pubkey()));
    assert_eq!(lottery.lamports(player.pubkey()).await, balance_before + 1);
}

#[tokio::test]
async fn test_picks_a_winner_resets_and_sends_money() {
    let entrance_fee = 10_000_000;
    let mut lottery = TestLottery::start(entrance_fee, 30).await;
    let mut players = Vec::new();
    for _ in 0..4 {
        let player = lottery.funded_player().await;
        lottery.enter(&player, entrance_fee).await.unwrap();
        players.push(player);
    }
    let starting_timestamp = lottery.round().await.latest_timestamp();
    lottery.advance_clock(31).await;
    lottery.perform_upkeep(0).await.unwrap();

    let word = 7;
    let winner = players[winner_index(&word_from_u64(word), 4) as usize].pubkey();
    let loser = players[0].pubkey();
    let winner_before = lottery.lamports(winner).await;

    // Payout to anyone other than the drawn player is refused and changes nothing.
    let result = lottery.fulfill(&loser, 1, word).await;
    assert_lottery_error(result, LotteryError::WinnerAccountMismatch);
    assert_eq!(lottery.round().await.state(), LotteryState::Calculating);

    lottery.fulfill(&winner, 1, word).await.unwrap();

    let round = lottery.round().await;
    assert_eq!(round.state(), LotteryState::Open);
    assert_eq!(round.number_of_players(), 0);
    assert!(round.latest_timestamp() > starting_timestamp);
    assert_eq!(round.recent_winner().map(|record| record.winner), Some(winner));
    assert_eq!(lottery.lamports(winner).await, winner_before + entrance_fee * 4);

    // Replaying the fulfillment pays nothing.
    let result = lottery.fulfill(&winner, 1, word + 1).await;
    assert_lottery_error(result, LotteryError::UnknownRequest);
}

#[tokio::test]
async fn test_two_consecutive_rounds() {
    let entrance_fee = 10_000_000;
    let mut lottery = TestLottery::start(entrance_fee, 30).await;
    let alice = lottery.funded_player().await;
    let bob = lottery.funded_player().await;

    lottery.enter(&alice, entrance_fee).await.unwrap();
    lottery.enter(&bob, entrance_fee).await.unwrap();
    lottery.advance_clock(31).await;
    lottery.perform_upkeep(0).await.unwrap();
    let alice_before = lottery.lamports(alice.pubkey()).await;
    lottery.fulfill(&alice.pubkey(), 1, 0).await.unwrap();
    assert_eq!(lottery.lamports(alice.pubkey()).await, alice_before + entrance_fee * 2);
    assert_eq!(lottery.round().await.number_of_players(), 0);

    lottery.enter(&bob, entrance_fee * 3).await.unwrap();
    lottery.advance_clock(31).await;
    lottery.perform_upkeep(1).await.unwrap();
    assert_eq!(lottery.round().await.pending_request_id(), Some(2));
    let bob_before = lottery.lamports(bob.pubkey()).await;
    lottery.fulfill(&bob.pubkey(), 2, 5).await.unwrap();

    assert_eq!(lottery.lamports(bob.pubkey()).await, bob_before + entrance_fee * 3);
    let round = lottery.round().await;
    assert_eq!(round.rounds_settled(), 2);
    assert_eq!(round.number_of_players(), 0);
}

#[tokio::test]
async fn test_payout_to_read_only_winner_is_rejected() {
    let mut lottery = TestLottery::start(10_000_000, 30).await;
    let player = lottery.funded_player().await;
    lottery.enter(&player, 10_000_000).await.unwrap();
    lottery.advance_clock(31).await;
    lottery.perform_upkeep(0).await.unwrap();
    let round_address = find_round_address(&lottery.program_id).0;
    let escrow_before = lottery.lamports(round_address).await;

    let mut ix = instruction::fulfill_random_words(
        &lottery.program_id,
        &lottery.oracle.pubkey(),
        &player.pubkey(),
        1,
        vec![word_from_u64(7)],
    );
    ix.accounts[3].is_writable = false;
    let oracle = Keypair::from_bytes(&lottery.oracle.to_bytes()).unwrap();
    let result = lottery.send(&[ix], &[&oracle]).await;
    assert_lottery_error(result, LotteryError::PayoutRejected);

    let round = lottery.round().await;
    assert_eq!(round.state(), LotteryState::Calculating);
    assert_eq!(round.pending_request_id(), Some(1));
    assert_eq!(round.number_of_players(), 1);
    assert_eq!(lottery.lamports(round_address).await, escrow_before);

    lottery.fulfill(&player.pubkey(), 1, 7).await.unwrap();
    assert_eq!(lottery.round().await.state(), LotteryState::Open);
}
