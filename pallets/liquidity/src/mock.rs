use crate as pallet_liquidity;
use crate::{LiquidityParams, PoolRecordOf};
use frame_support::{
	construct_runtime, parameter_types,
	traits::{ConstBool, ConstU16, ConstU32, ConstU64, Everything, GenesisBuild, Hooks},
	weights::constants::RocksDbWeight,
	PalletId,
};
use frame_system::EnsureRoot;
use primitives::{currency::*, Balance, Coin};
use sp_core::H256;
use sp_runtime::{
	testing::Header,
	traits::{BlakeTwo256, IdentityLookup},
};

type UncheckedExtrinsic = frame_system::mocking::MockUncheckedExtrinsic<Test>;
type Block = frame_system::mocking::MockBlock<Test>;

pub type AccountId = u64;

pub const ALICE: AccountId = 1;
pub const BOB: AccountId = 2;
pub const CHARLIE: AccountId = 3;
pub const DAVE: AccountId = 4;
pub const FEE_COLLECTOR: AccountId = 99;

pub const INITIAL_BALANCE: Balance = 1_000_000_000_000;
pub const CREATION_FEE: Balance = 1_000;

construct_runtime!(
	pub enum Test where
		Block = Block,
		NodeBlock = Block,
		UncheckedExtrinsic = UncheckedExtrinsic,
	{
		System: frame_system,
		Tokens: pallet_tokens,
		Liquidity: pallet_liquidity,
	}
);

impl frame_system::Config for Test {
	type BaseCallFilter = Everything;
	type BlockWeights = ();
	type BlockLength = ();
	type DbWeight = RocksDbWeight;
	type RuntimeOrigin = RuntimeOrigin;
	type RuntimeCall = RuntimeCall;
	type Index = u64;
	type BlockNumber = u64;
	type Hash = H256;
	type Hashing = BlakeTwo256;
	type AccountId = AccountId;
	type Lookup = IdentityLookup<Self::AccountId>;
	type Header = Header;
	type RuntimeEvent = RuntimeEvent;
	type BlockHashCount = ConstU64<250>;
	type Version = ();
	type PalletInfo = PalletInfo;
	type AccountData = ();
	type OnNewAccount = ();
	type OnKilledAccount = ();
	type SystemWeightInfo = ();
	type SS58Prefix = ConstU16<42>;
	type OnSetCode = ();
	type MaxConsumers = ConstU32<16>;
}

impl pallet_tokens::Config for Test {
	type RuntimeEvent = RuntimeEvent;
}

parameter_types! {
	pub const LiquidityPalletId: PalletId = PalletId(*b"liquidit");
	pub const FeeCollector: AccountId = FEE_COLLECTOR;
	pub static OrderLifeSpan: u64 = 0;
}

impl pallet_liquidity::Config for Test {
	type RuntimeEvent = RuntimeEvent;
	type Currency = Tokens;
	type PalletId = LiquidityPalletId;
	type OrderLifeSpan = OrderLifeSpan;
	type FeeCollector = FeeCollector;
	type EnableInvariantChecks = ConstBool<true>;
	type UpdateOrigin = EnsureRoot<AccountId>;
}

pub struct ExtBuilder {
	balances: Vec<(AccountId, CurrencyId, Balance)>,
	params: LiquidityParams,
	pool_records: Vec<PoolRecordOf<Test>>,
	order_life_span: u64,
}

impl Default for ExtBuilder {
	fn default() -> Self {
		let balances = [ALICE, BOB, CHARLIE]
			.iter()
			.flat_map(|who| [ACA, AUSD, DOT].into_iter().map(move |currency_id| (*who, currency_id, INITIAL_BALANCE)))
			.collect();
		ExtBuilder {
			balances,
			params: LiquidityParams {
				pool_creation_fee: vec![Coin::new(AUSD, CREATION_FEE)],
				..Default::default()
			},
			pool_records: vec![],
			order_life_span: 0,
		}
	}
}

impl ExtBuilder {
	pub fn unit_batch_height(mut self, height: u32) -> Self {
		self.params.unit_batch_height = height;
		self
	}

	pub fn order_life_span(mut self, span: u64) -> Self {
		self.order_life_span = span;
		self
	}

	/// Replaces the default balances, for restoring an exported ledger.
	pub fn balances(mut self, balances: Vec<(AccountId, CurrencyId, Balance)>) -> Self {
		self.balances = balances;
		self
	}

	pub fn params(mut self, params: LiquidityParams) -> Self {
		self.params = params;
		self
	}

	pub fn pool_records(mut self, records: Vec<PoolRecordOf<Test>>) -> Self {
		self.pool_records = records;
		self
	}

	pub fn build(self) -> sp_io::TestExternalities {
		let mut t = frame_system::GenesisConfig::default().build_storage::<Test>().unwrap();
		pallet_tokens::GenesisConfig::<Test> { balances: self.balances }
			.assimilate_storage(&mut t)
			.unwrap();
		pallet_liquidity::GenesisConfig::<Test> { params: self.params, pool_records: self.pool_records }
			.assimilate_storage(&mut t)
			.unwrap();

		OrderLifeSpan::set(self.order_life_span);
		let mut ext = sp_io::TestExternalities::new(t);
		ext.execute_with(|| System::set_block_number(1));
		ext
	}
}

pub fn new_test_ext() -> sp_io::TestExternalities {
	ExtBuilder::default().build()
}

/// Finalizes the current block and initializes the next one.
pub fn next_block() {
	let now = System::block_number();
	Liquidity::on_finalize(now);
	System::set_block_number(now + 1);
	Liquidity::on_initialize(now + 1);
}

pub fn run_to_block(n: u64) {
	while System::block_number() < n {
		next_block();
	}
}
